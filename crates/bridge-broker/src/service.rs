//! Broker service: wires the store, dispatcher, listener, and deadline
//! sweep together over one shared queue.

use crate::domain::config::BrokerConfig;
use crate::domain::error::{BrokerError, WorkError};
use crate::domain::pending::{PendingRequestStore, PendingStats};
use crate::ports::outbound::{CompletionSource, OrderSink, SystemTimeSource, TimeSource};
use crate::supervisor::deadline_sweep;
use crate::transport::{Dispatcher, QueueCompletionSource, QueueOrderSink, ResponseListener};
use shared_queue::InMemoryQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// The assembled broker.
///
/// `new` validates the configuration and builds the pieces; `start` spawns
/// the response listener and the deadline sweep. Dispatching before
/// `start` parks callers until their deadline, since nothing is reading
/// completions yet.
pub struct BrokerService {
    config: BrokerConfig,
    pending: Arc<PendingRequestStore>,
    dispatcher: Dispatcher,
    queue: Arc<InMemoryQueue>,
    tasks: Vec<JoinHandle<()>>,
}

impl BrokerService {
    /// Create a new broker service over the given queue.
    pub fn new(config: BrokerConfig, queue: Arc<InMemoryQueue>) -> Result<Self, BrokerError> {
        config.validate()?;

        let pending = Arc::new(PendingRequestStore::new(config.default_timeout));
        let sink: Arc<dyn OrderSink> = Arc::new(QueueOrderSink::new(queue.clone()));
        let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        let dispatcher = Dispatcher::new(pending.clone(), sink, clock, &config);

        Ok(Self {
            config,
            pending,
            dispatcher,
            queue,
            tasks: Vec::new(),
        })
    }

    /// Spawn the response listener and the deadline sweep.
    pub fn start(&mut self) -> Result<(), BrokerError> {
        if !self.tasks.is_empty() {
            return Err(BrokerError::AlreadyStarted);
        }

        let source: Arc<dyn CompletionSource> =
            Arc::new(QueueCompletionSource::new(&self.queue));
        let listener = ResponseListener::new(self.pending.clone(), source);
        self.tasks.push(tokio::spawn(listener.run()));

        self.tasks.push(tokio::spawn(deadline_sweep(
            self.pending.clone(),
            self.config.sweep_interval,
        )));

        info!(
            default_timeout_ms = self.config.default_timeout.as_millis() as u64,
            sweep_interval_ms = self.config.sweep_interval.as_millis() as u64,
            "Broker started"
        );

        Ok(())
    }

    /// Dispatch one unit of work and wait for its result.
    pub async fn dispatch(
        &self,
        payload: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, WorkError> {
        self.dispatcher.dispatch(payload, timeout).await
    }

    /// Number of callers currently awaiting a completion.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Registry statistics.
    pub fn stats(&self) -> &PendingStats {
        self.pending.stats()
    }

    /// The queue this broker publishes to.
    pub fn queue(&self) -> &Arc<InMemoryQueue> {
        &self.queue
    }

    /// Abort the background tasks.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
