//! # taskbridge Test Suite
//!
//! Unified test crate containing cross-crate flows:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── broker_flow.rs          # caller → queue → worker → caller roundtrips
//!     └── registry_properties.rs  # registry invariants under contention
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p bridge-tests
//!
//! # By category
//! cargo test -p bridge-tests integration::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a tracing subscriber once for the whole suite. Controlled by
/// `RUST_LOG`, silent by default.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
