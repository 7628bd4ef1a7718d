//! Broker error taxonomy.
//!
//! Two layers: `WorkError` is a per-request outcome and travels to the
//! waiting caller through the same channel as a success, so every caller
//! observes exactly one tagged result. `BrokerError` is a broker-level
//! fault that never reaches a waiter.

use crate::domain::config::ConfigError;
use crate::domain::correlation::CorrelationId;
use std::time::Duration;
use thiserror::Error;

/// Per-request failure delivered to the waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkError {
    /// The work order could not be published. Surfaced immediately, the
    /// caller never waits; retry policy belongs to the queue client.
    #[error("publish failed: {0}")]
    Publish(String),

    /// No completion matched before the deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The caller abandoned the wait before an outcome arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The worker reported a fault for this unit of work.
    #[error("worker fault {code}: {message}")]
    Worker {
        /// Machine-readable fault code from the worker.
        code: i32,
        /// Human-readable description.
        message: String,
    },

    /// A freshly generated correlation ID collided with a live entry.
    /// Practically unreachable with 128-bit random ids; fails only this
    /// one request.
    #[error("duplicate correlation id: {0}")]
    DuplicateId(CorrelationId),

    /// The waiter side of the channel disappeared under the caller.
    #[error("response channel closed")]
    ChannelClosed,
}

/// Broker-level errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Configuration rejected at startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `start()` was called on a service that is already running.
    #[error("broker already started")]
    AlreadyStarted,
}
