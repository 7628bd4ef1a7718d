//! # Shared Queue - Message Queue Between Web and Worker Tiers
//!
//! In-memory queue carrying traffic in both directions between the two
//! tiers of the bridge:
//!
//! ```text
//! ┌──────────────┐                        ┌──────────────┐
//! │   Web tier   │   publish(WorkOrder)   │  Worker tier │
//! │   (broker)   │ ──────┐                │              │
//! └──────────────┘       │                └──────────────┘
//!        ↑               ▼                       │ ↑
//!        │         ┌──────────────┐             │ │ subscribe(Work)
//!        │         │    Queue     │ ◄───────────┘ │
//!        └──────── │              │ ──────────────┘
//!  subscribe(      └──────────────┘
//!  Completions)          ▲
//!                        │ publish(CompletionNotice)
//! ```
//!
//! Delivery is at-least-once from the consumer's point of view: a slow
//! subscriber may observe duplicates after lag recovery, and nothing here
//! deduplicates. Matching a completion back to its caller is the broker's
//! job, keyed by the correlation ID carried in every message.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod messages;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use messages::{
    CompletionNotice, MessageFilter, QueueMessage, QueueTopic, Tier, WorkOrder, WorkerFault,
};
pub use publisher::{InMemoryQueue, QueuePublisher};
pub use subscriber::{MessageStream, Subscription, SubscriptionError};

/// Maximum messages to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
