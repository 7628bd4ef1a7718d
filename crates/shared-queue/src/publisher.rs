//! # Queue Publisher
//!
//! Defines the publishing side of the queue.

use crate::messages::{MessageFilter, QueueMessage};
use crate::subscriber::{MessageStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing messages to the queue.
///
/// Both tiers use this interface: the web tier to submit work orders, the
/// worker tier to report completions.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Publish a message to the queue.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the message.
    async fn publish(&self, message: QueueMessage) -> usize;

    /// Get the total number of messages published.
    fn messages_published(&self) -> u64;
}

/// In-memory implementation of the queue.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Suitable for single-node operation; distributed deployments
/// would swap this for a hosted queue service behind the same traits.
pub struct InMemoryQueue {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<QueueMessage>,

    /// Active subscription count by topic.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryQueue {
    /// Create a new in-memory queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory queue with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to messages matching a filter.
    ///
    /// Returns a `Subscription` handle that can be used to receive messages.
    #[must_use]
    pub fn subscribe(&self, filter: MessageFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}", filter.topics);

        // Track subscription
        {
            if let Ok(mut subs) = self.subscriptions.write() {
                *subs.entry(topic_key.clone()).or_insert(0) += 1;
            }
        }

        debug!(topics = ?filter.topics, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    /// Get a stream of messages matching a filter.
    ///
    /// This is a convenience method that returns a `MessageStream`.
    #[must_use]
    pub fn message_stream(&self, filter: MessageFilter) -> MessageStream {
        MessageStream::new(self.subscribe(filter))
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueuePublisher for InMemoryQueue {
    async fn publish(&self, message: QueueMessage) -> usize {
        let topic = message.topic();
        let tier = message.source_tier();

        // Always increment counter (publish was attempted)
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(message) {
            Ok(receiver_count) => {
                debug!(
                    topic = ?topic,
                    tier = ?tier,
                    receivers = receiver_count,
                    "Message published"
                );
                receiver_count
            }
            Err(e) => {
                // No receivers - message is dropped
                warn!(
                    topic = ?topic,
                    tier = ?tier,
                    error = %e,
                    "Message dropped (no receivers)"
                );
                0
            }
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
