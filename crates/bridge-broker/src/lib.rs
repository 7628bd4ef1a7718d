//! # Bridge Broker - Synchronous Front Door Over an Asynchronous Worker Pool
//!
//! A caller hands the broker one unit of work and blocks on the answer. The
//! broker publishes the work to an out-of-process worker pool through the
//! shared queue and resumes that exact caller, exactly once, when a worker
//! reports back, or fails the caller cleanly at its deadline.
//!
//! # Architecture
//!
//! ```text
//! caller ──► Dispatcher ──registers──► PendingRequestStore
//!                │                          ▲        ▲
//!                │ publishes WorkOrder      │        │ expire past
//!                ▼                          │        │ deadline
//!          ┌───────────┐            resolve │   ┌────┴─────────┐
//!          │   Queue   │            or fail │   │ DeadlineSweep│
//!          └───────────┘                    │   └──────────────┘
//!                │ CompletionNotice         │
//!                ▼                          │
//!         ResponseListener ─────────────────┘
//! ```
//!
//! The store is the only shared mutable state. Every transition out of the
//! pending state goes through its single-winner removal, so a completion
//! racing a deadline can never resume a caller twice.
//!
//! # Usage
//!
//! ```ignore
//! use bridge_broker::{BrokerConfig, BrokerService};
//! use shared_queue::InMemoryQueue;
//! use std::sync::Arc;
//!
//! let queue = Arc::new(InMemoryQueue::new());
//! let mut service = BrokerService::new(BrokerConfig::default(), queue)?;
//! service.start()?;
//! let result = service.dispatch(payload, None).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod ports;
pub mod service;
pub mod supervisor;
pub mod transport;

// Re-exports for public API
pub use domain::config::{BrokerConfig, ConfigError};
pub use domain::correlation::CorrelationId;
pub use domain::error::{BrokerError, WorkError};
pub use domain::pending::{PendingRequestStore, PendingStats, WorkReply};
pub use ports::outbound::{
    CompletionSource, OrderSink, SystemTimeSource, TimeSource, TransportError,
};
pub use service::BrokerService;
pub use supervisor::deadline_sweep;
pub use transport::{Dispatcher, QueueCompletionSource, QueueOrderSink, ResponseListener};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
