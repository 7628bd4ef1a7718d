//! Response listener: routes completion notices back to parked callers.

use crate::domain::correlation::CorrelationId;
use crate::domain::error::WorkError;
use crate::domain::pending::PendingRequestStore;
use crate::ports::outbound::{CompletionSource, TransportError};
use shared_queue::CompletionNotice;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Listener loop matching completion notices to pending requests.
///
/// Runs until its source closes. A malformed or unmatched notice is
/// dropped and logged; nothing a worker sends can stop the loop from
/// servicing every other caller.
pub struct ResponseListener {
    pending: Arc<PendingRequestStore>,
    source: Arc<dyn CompletionSource>,
}

impl ResponseListener {
    pub fn new(pending: Arc<PendingRequestStore>, source: Arc<dyn CompletionSource>) -> Self {
        Self { pending, source }
    }

    /// Run the listener loop.
    pub async fn run(self) {
        loop {
            match self.source.receive().await {
                Ok(notice) => {
                    self.handle_notice(notice);
                }
                Err(TransportError::ChannelClosed) => {
                    warn!("Completion source closed, stopping listener");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Error receiving completion notice");
                }
            }
        }
    }

    fn handle_notice(&self, notice: CompletionNotice) {
        let correlation_id = match CorrelationId::parse(&notice.correlation_id) {
            Ok(id) => id,
            Err(e) => {
                // Unattributable: no specific caller can be failed for it
                warn!(
                    correlation_id = %notice.correlation_id,
                    worker = %notice.worker,
                    error = %e,
                    "Discarding malformed completion notice"
                );
                return;
            }
        };

        let matched = match notice.result {
            Ok(value) => self.pending.resolve(correlation_id, value),
            Err(fault) => self.pending.fail(
                correlation_id,
                WorkError::Worker {
                    code: fault.code,
                    message: fault.message,
                },
            ),
        };

        if !matched {
            // Late, duplicate, or never ours. Not a protocol fault.
            debug!(
                correlation_id = %correlation_id,
                worker = %notice.worker,
                "Completion for unknown or already resolved request"
            );
        }
    }
}
