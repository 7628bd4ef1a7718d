//! Request dispatcher: the synchronous caller's entry point.

use crate::domain::config::BrokerConfig;
use crate::domain::error::WorkError;
use crate::domain::pending::PendingRequestStore;
use crate::ports::outbound::{OrderSink, TimeSource};
use shared_queue::WorkOrder;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Dispatches one unit of work and parks the caller until the answer
/// arrives or the deadline passes.
pub struct Dispatcher {
    /// Pending request store for correlation.
    pending: Arc<PendingRequestStore>,
    /// Sink for outgoing work orders.
    sink: Arc<dyn OrderSink>,
    /// Clock used to stamp orders.
    clock: Arc<dyn TimeSource>,
    /// Deadline when the caller names none.
    default_timeout: Duration,
    /// Hard ceiling on any caller-supplied deadline.
    max_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        pending: Arc<PendingRequestStore>,
        sink: Arc<dyn OrderSink>,
        clock: Arc<dyn TimeSource>,
        config: &BrokerConfig,
    ) -> Self {
        Self {
            pending,
            sink,
            clock,
            default_timeout: config.default_timeout,
            max_timeout: config.max_timeout,
        }
    }

    /// Publish a work order and wait for its completion.
    ///
    /// Registration happens before the publish, so a completion from a
    /// pathologically fast worker still finds the registry entry. If the
    /// publish fails the entry is removed and the error returned without
    /// waiting. This is the broker's only suspension point.
    pub async fn dispatch(
        &self,
        payload: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, WorkError> {
        let timeout = timeout.unwrap_or(self.default_timeout).min(self.max_timeout);

        let (correlation_id, rx) = self.pending.register(Some(timeout))?;

        let order = WorkOrder {
            correlation_id: correlation_id.to_string(),
            payload,
            submitted_at_ms: self.clock.now_ms(),
        };

        if let Err(e) = self.sink.send(order).await {
            // Single attempt: free the entry and surface immediately
            let err = WorkError::Publish(e.to_string());
            self.pending.fail(correlation_id, err.clone());
            return Err(err);
        }

        debug!(
            correlation_id = %correlation_id,
            timeout_ms = timeout.as_millis() as u64,
            "Dispatched work order"
        );

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => {
                debug!(
                    correlation_id = %correlation_id,
                    waited_ms = reply.waited.as_millis() as u64,
                    "Work reply received"
                );
                reply.result
            }
            Ok(Err(_)) => {
                // Store dropped while we were waiting
                Err(WorkError::ChannelClosed)
            }
            Err(_) => {
                // Deadline reached on the caller's side; a completion that
                // won the race an instant earlier is dropped with rx
                self.pending.expire(correlation_id);
                Err(WorkError::Timeout(timeout))
            }
        }
    }

    /// Get pending request count.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
