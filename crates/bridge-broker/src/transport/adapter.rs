//! Queue adapters for the broker's outbound ports.
//!
//! Bind `OrderSink` and `CompletionSource` to the shared queue so the
//! dispatcher and listener stay transport-agnostic.

use crate::ports::outbound::{CompletionSource, OrderSink, TransportError};
use async_trait::async_trait;
use shared_queue::{
    CompletionNotice, InMemoryQueue, MessageFilter, QueueMessage, QueuePublisher, QueueTopic,
    Subscription, WorkOrder,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Publishes work orders onto the shared queue.
pub struct QueueOrderSink {
    queue: Arc<InMemoryQueue>,
}

impl QueueOrderSink {
    pub fn new(queue: Arc<InMemoryQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl OrderSink for QueueOrderSink {
    async fn send(&self, order: WorkOrder) -> Result<(), TransportError> {
        let correlation_id = order.correlation_id.clone();

        let receivers = self.queue.publish(QueueMessage::Work(order)).await;

        if receivers == 0 {
            warn!(
                correlation_id = %correlation_id,
                "No subscribers for work order (worker pool may not be running)"
            );
        } else {
            debug!(
                correlation_id = %correlation_id,
                receivers = receivers,
                "Work order delivered to {} subscriber(s)",
                receivers
            );
        }

        Ok(())
    }
}

/// Receives completion notices from the shared queue.
///
/// Holds a `Completions`-topic subscription created at construction time,
/// so notices published after the source exists are never missed.
pub struct QueueCompletionSource {
    subscription: Mutex<Subscription>,
}

impl QueueCompletionSource {
    pub fn new(queue: &InMemoryQueue) -> Self {
        let filter = MessageFilter::topics(vec![QueueTopic::Completions]);
        Self {
            subscription: Mutex::new(queue.subscribe(filter)),
        }
    }
}

#[async_trait]
impl CompletionSource for QueueCompletionSource {
    async fn receive(&self) -> Result<CompletionNotice, TransportError> {
        let mut subscription = self.subscription.lock().await;
        loop {
            match subscription.recv().await {
                Some(QueueMessage::Completion(notice)) => return Ok(notice),
                // The filter already excludes these; skip if one slips through
                Some(_) => continue,
                None => return Err(TransportError::ChannelClosed),
            }
        }
    }
}
