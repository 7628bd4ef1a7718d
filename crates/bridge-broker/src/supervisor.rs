//! Deadline supervision for pending requests.

use crate::domain::pending::PendingRequestStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Background task that expires pending requests past their deadline.
///
/// Every entry the listener never matches is failed with a timeout within
/// one sweep interval of its deadline, which wakes any caller still
/// waiting and keeps the registry from growing without bound. Ticks missed
/// under load are skipped rather than bursted.
pub async fn deadline_sweep(store: Arc<PendingRequestStore>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let expired = store.sweep_expired();
        if expired > 0 {
            debug!(expired = expired, "Expired overdue pending requests");
        }
    }
}
