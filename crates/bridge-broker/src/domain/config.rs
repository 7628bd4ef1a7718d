//! Broker configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Deadline applied to a dispatch that does not name its own timeout.
    pub default_timeout: Duration,
    /// Upper bound on any per-dispatch timeout; longer requests are clamped.
    pub max_timeout: Duration,
    /// Cadence of the deadline sweep over the pending registry.
    pub sweep_interval: Duration,
    /// Capacity of the underlying queue channel.
    pub queue_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            // Results older than 30s are stale to the worker tier as well
            default_timeout: Duration::from_secs(30),
            max_timeout: Duration::from_secs(420),
            sweep_interval: Duration::from_millis(500),
            queue_capacity: 1000,
        }
    }
}

impl BrokerConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "default_timeout cannot be 0".into(),
            ));
        }

        if self.max_timeout < self.default_timeout {
            return Err(ConfigError::InvalidTimeout(
                "max_timeout cannot be shorter than default_timeout".into(),
            ));
        }

        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidInterval(
                "sweep_interval cannot be 0".into(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "queue_capacity cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A timeout bound is unusable.
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// The sweep cadence is unusable.
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// A channel capacity is unusable.
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),
}
