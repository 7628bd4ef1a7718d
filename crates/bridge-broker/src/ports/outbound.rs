//! Outbound ports for the broker.
//!
//! The queue behind these traits is an external collaborator: the broker
//! only assumes a single-attempt send and an at-least-once, possibly
//! duplicated, unordered completion feed.

use async_trait::async_trait;
use shared_queue::{CompletionNotice, WorkOrder};
use thiserror::Error;

/// Transport failures at the queue boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The channel to the queue is gone.
    #[error("channel closed")]
    ChannelClosed,

    /// The send was attempted and rejected.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Outbound work queue. One attempt per order, no retry here.
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Publish a work order for the worker pool.
    async fn send(&self, order: WorkOrder) -> Result<(), TransportError>;
}

/// Inbound completion feed from the worker pool.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Receive the next completion notice (blocks until available).
    async fn receive(&self) -> Result<CompletionNotice, TransportError>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Current time as epoch milliseconds.
    fn now_ms(&self) -> u64;
}

/// System time implementation
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_else(|_| {
                // Clock before Unix epoch - return 0 rather than panic
                // This should never happen in practice
                0
            })
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self
    }
}
