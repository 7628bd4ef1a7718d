//! Queue integration: the dispatcher that publishes work orders, the
//! listener that routes completions back, and the adapters binding both
//! to the shared queue.

pub mod adapter;
pub mod dispatcher;
pub mod listener;

pub use adapter::{QueueCompletionSource, QueueOrderSink};
pub use dispatcher::Dispatcher;
pub use listener::ResponseListener;
