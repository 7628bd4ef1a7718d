//! # Queue Messages
//!
//! Defines the messages that flow through the queue in both directions:
//! work orders submitted by the web tier, completion notices reported back
//! by the worker tier.

use serde::{Deserialize, Serialize};

/// A unit of work published by the web tier for any worker to pick up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Correlation ID linking this order to its eventual completion.
    pub correlation_id: String,
    /// Opaque task payload. Workers interpret it, the queue does not.
    pub payload: serde_json::Value,
    /// When the web tier submitted the order (epoch milliseconds).
    pub submitted_at_ms: u64,
}

/// Outcome reported by a worker for one work order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionNotice {
    /// Correlation ID matching the original work order.
    pub correlation_id: String,
    /// Identifier of the worker instance that produced the outcome.
    pub worker: String,
    /// Result payload, or the fault the worker ran into.
    pub result: Result<serde_json::Value, WorkerFault>,
    /// When the worker picked the order up (epoch milliseconds).
    pub received_at_ms: u64,
    /// When the worker finished (epoch milliseconds).
    pub completed_at_ms: u64,
}

/// Error reported by a worker inside a completion notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerFault {
    /// Machine-readable fault code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

/// All messages that can be published to the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueueMessage {
    /// A new unit of work for the worker pool.
    /// Source: web tier | Consumed by: workers
    Work(WorkOrder),

    /// A finished unit of work reported back to the web tier.
    /// Source: worker tier | Consumed by: broker response listener
    Completion(CompletionNotice),
}

impl QueueMessage {
    /// Get the topic for this message (for filtering).
    #[must_use]
    pub fn topic(&self) -> QueueTopic {
        match self {
            Self::Work(_) => QueueTopic::Work,
            Self::Completion(_) => QueueTopic::Completions,
        }
    }

    /// Get the tier this message originates from.
    #[must_use]
    pub fn source_tier(&self) -> Tier {
        match self {
            Self::Work(_) => Tier::WebTier,
            Self::Completion(_) => Tier::AppTier,
        }
    }

    /// Correlation ID carried by the message.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Work(order) => &order.correlation_id,
            Self::Completion(notice) => &notice.correlation_id,
        }
    }
}

/// Queue topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueTopic {
    /// Work orders headed for the worker pool.
    Work,
    /// Completion notices headed back to the web tier.
    Completions,
    /// All messages (no filtering).
    All,
}

/// The tier a message originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// The synchronous front door that dispatches work.
    WebTier,
    /// The worker pool that executes it.
    AppTier,
}

/// Filter for subscribing to a subset of queue traffic.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<QueueTopic>,
    /// Source tiers to include. Empty means all tiers.
    pub tiers: Vec<Tier>,
}

impl MessageFilter {
    /// Create a filter that accepts all messages.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<QueueTopic>) -> Self {
        Self {
            topics,
            tiers: Vec::new(),
        }
    }

    /// Create a filter for messages from specific tiers.
    #[must_use]
    pub fn from_tiers(tiers: Vec<Tier>) -> Self {
        Self {
            topics: Vec::new(),
            tiers,
        }
    }

    /// Check if a message matches this filter.
    #[must_use]
    pub fn matches(&self, message: &QueueMessage) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&QueueTopic::All)
            || self.topics.contains(&message.topic());

        let tier_match = self.tiers.is_empty() || self.tiers.contains(&message.source_tier());

        topic_match && tier_match
    }
}
