//! Pending Request Store - the correlation registry.
//!
//! Maps correlation IDs to callers blocked on a worker's answer. Every
//! transition out of the pending state is a single-winner removal: a
//! completion racing the deadline sweep (or a duplicate delivery racing
//! itself) resolves the caller at most once, and the losing side observes
//! a plain `false`.

use crate::domain::correlation::CorrelationId;
use crate::domain::error::WorkError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

/// What the waiting caller receives when its request leaves the registry.
#[derive(Debug)]
pub struct WorkReply {
    /// Correlation ID this reply is for.
    pub correlation_id: CorrelationId,
    /// Tagged outcome: the worker's payload or the failure that ended the wait.
    pub result: Result<serde_json::Value, WorkError>,
    /// How long the request sat in the registry.
    pub waited: Duration,
}

/// A caller parked in the registry.
struct PendingRequest {
    /// Channel that resumes the caller.
    sender: oneshot::Sender<WorkReply>,
    /// When the request was registered.
    created_at: Instant,
    /// Absolute time after which the request is abandoned.
    deadline: Instant,
}

/// Statistics for the pending request store.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total requests registered.
    pub registered: AtomicU64,
    /// Requests resolved with a worker result.
    pub fulfilled: AtomicU64,
    /// Requests failed (publish error, worker fault, cancellation).
    pub failed: AtomicU64,
    /// Requests expired at their deadline.
    pub expired: AtomicU64,
    /// Requests whose caller had already walked away.
    pub cancelled: AtomicU64,
}

/// Registry of callers awaiting completions, keyed by correlation ID.
///
/// Flow:
/// 1. The dispatcher calls `register()` and gets a oneshot receiver
/// 2. The dispatcher publishes a work order carrying the ID
/// 3. The response listener matches a completion and calls `resolve()`/`fail()`
/// 4. The deadline sweep calls `expire()` on anything left past its deadline
///
/// Entries leave the map in the same atomic step that decides their outcome,
/// so the registry can never grow past the set of live waiters.
pub struct PendingRequestStore {
    /// Map of correlation ID to pending request.
    pending: DashMap<CorrelationId, PendingRequest>,
    /// Deadline applied when `register` is not given one.
    default_timeout: Duration,
    /// Statistics.
    stats: Arc<PendingStats>,
}

impl PendingRequestStore {
    /// Create a new pending request store.
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            default_timeout,
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register a pending request and get a receiver for the reply.
    ///
    /// The entry is live in the map before this returns, so a completion
    /// arriving immediately after the subsequent publish always finds it.
    pub fn register(
        &self,
        timeout: Option<Duration>,
    ) -> Result<(CorrelationId, oneshot::Receiver<WorkReply>), WorkError> {
        let correlation_id = CorrelationId::new();
        let rx = self.insert(correlation_id, timeout)?;
        Ok((correlation_id, rx))
    }

    fn insert(
        &self,
        correlation_id: CorrelationId,
        timeout: Option<Duration>,
    ) -> Result<oneshot::Receiver<WorkReply>, WorkError> {
        let (tx, rx) = oneshot::channel();
        let now = Instant::now();
        let timeout = timeout.unwrap_or(self.default_timeout);

        match self.pending.entry(correlation_id) {
            Entry::Occupied(_) => {
                // Generator invariant broken. Fail this registration only.
                error!(
                    correlation_id = %correlation_id,
                    "Correlation ID collision, rejecting registration"
                );
                return Err(WorkError::DuplicateId(correlation_id));
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingRequest {
                    sender: tx,
                    created_at: now,
                    deadline: now + timeout,
                });
            }
        }

        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            timeout_ms = timeout.as_millis() as u64,
            "Registered pending request"
        );

        Ok(rx)
    }

    /// Resolve a pending request with a worker's result.
    ///
    /// Returns true if this call won the transition, false if the ID is
    /// absent (already resolved, expired, or never registered).
    pub fn resolve(&self, correlation_id: CorrelationId, value: serde_json::Value) -> bool {
        let Some((_, request)) = self.pending.remove(&correlation_id) else {
            return false;
        };

        self.stats.fulfilled.fetch_add(1, Ordering::Relaxed);
        self.deliver(correlation_id, request, Ok(value));
        true
    }

    /// Fail a pending request. Same single-winner contract as `resolve`.
    pub fn fail(&self, correlation_id: CorrelationId, err: WorkError) -> bool {
        let Some((_, request)) = self.pending.remove(&correlation_id) else {
            return false;
        };

        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        self.deliver(correlation_id, request, Err(err));
        true
    }

    /// Expire a pending request past its deadline, waking the caller with a
    /// timeout. Same single-winner contract as `resolve`.
    pub fn expire(&self, correlation_id: CorrelationId) -> bool {
        let Some((_, request)) = self.pending.remove(&correlation_id) else {
            return false;
        };

        let timeout = request.deadline.duration_since(request.created_at);
        self.stats.expired.fetch_add(1, Ordering::Relaxed);
        warn!(
            correlation_id = %correlation_id,
            timeout_ms = timeout.as_millis() as u64,
            "Expiring pending request past its deadline"
        );
        self.deliver(correlation_id, request, Err(WorkError::Timeout(timeout)));
        true
    }

    /// Best-effort removal for a caller that abandoned the wait. The entry
    /// would be reclaimed by the sweep anyway; this frees it early.
    pub fn cancel(&self, correlation_id: CorrelationId) -> bool {
        let Some((_, request)) = self.pending.remove(&correlation_id) else {
            return false;
        };

        self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
        self.deliver(correlation_id, request, Err(WorkError::Cancelled));
        true
    }

    /// Expire every entry past its deadline.
    ///
    /// Overdue IDs are collected first and expired one by one, so no shard
    /// lock is held while callers are being woken.
    ///
    /// Returns the number of requests expired.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let overdue: Vec<CorrelationId> = self
            .pending
            .iter()
            .filter(|entry| entry.value().deadline <= now)
            .map(|entry| *entry.key())
            .collect();

        overdue.into_iter().filter(|id| self.expire(*id)).count()
    }

    /// Number of currently pending requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check if a correlation ID is pending.
    pub fn contains(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Get statistics.
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }

    fn deliver(
        &self,
        correlation_id: CorrelationId,
        request: PendingRequest,
        result: Result<serde_json::Value, WorkError>,
    ) {
        let waited = request.created_at.elapsed();
        let reply = WorkReply {
            correlation_id,
            result,
            waited,
        };

        if request.sender.send(reply).is_err() {
            // Receiver dropped: the caller disconnected while the entry was
            // still live. The outcome has nowhere to go.
            debug!(
                correlation_id = %correlation_id,
                waited_ms = waited.as_millis() as u64,
                "Pending request receiver dropped"
            );
        }
    }
}
