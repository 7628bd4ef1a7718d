//! # Queue Subscriber
//!
//! Defines the consuming side of the queue.

use crate::messages::{MessageFilter, QueueMessage};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The queue was closed.
    #[error("Queue closed")]
    Closed,
}

/// A subscription handle for receiving messages.
///
/// When dropped, the subscription is automatically cleaned up.
pub struct Subscription {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<QueueMessage>,

    /// Filter for this subscription.
    filter: MessageFilter,

    /// Reference to subscription tracking (for cleanup).
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Topic key for this subscription.
    topic_key: String,
}

impl Subscription {
    /// Create a new subscription.
    pub(crate) fn new(
        receiver: broadcast::Receiver<QueueMessage>,
        filter: MessageFilter,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
        topic_key: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            subscriptions,
            topic_key,
        }
    }

    /// Receive the next message that matches the filter.
    ///
    /// A lagged consumer skips the overrun and keeps receiving; the queue
    /// offers no replay, so redelivery is the publisher's concern.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next matching message
    /// - `None` - The channel was closed (queue dropped)
    pub async fn recv(&mut self) -> Option<QueueMessage> {
        loop {
            let message = match self.receiver.recv().await {
                Ok(m) => m,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some messages dropped");
                    continue;
                }
            };

            if self.filter.matches(&message) {
                return Some(message);
            }
            // Message doesn't match filter, continue waiting
        }
    }

    /// Try to receive the next message without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - A message was available and matched
    /// - `Ok(None)` - No message available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<QueueMessage>, SubscriptionError> {
        loop {
            let message = match self.receiver.try_recv() {
                Ok(m) => m,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&message) {
                return Ok(Some(message));
            }
            // Message doesn't match filter, try again
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Decrement subscription count
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        let Some(count) = subs.get_mut(&self.topic_key) else {
            debug!(topic = %self.topic_key, "Subscription dropped");
            return;
        };

        *count = count.saturating_sub(1);
        if *count == 0 {
            subs.remove(&self.topic_key);
        }
        debug!(topic = %self.topic_key, "Subscription dropped");
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct MessageStream {
    subscription: Subscription,
}

impl MessageStream {
    /// Create a new message stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &MessageFilter {
        self.subscription.filter()
    }
}

impl Stream for MessageStream {
    type Item = QueueMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Use try_recv for non-blocking check
        match self.subscription.try_recv() {
            Ok(Some(message)) => Poll::Ready(Some(message)),
            Ok(None) => {
                // No message ready, need to wait
                // Register waker and return pending
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}
