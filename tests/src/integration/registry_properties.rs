//! # Registry Invariants Under Contention
//!
//! Hammers the pending request store directly: whatever races against
//! whatever, a request leaves the registry exactly once and every caller
//! observes exactly one outcome.

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    use bridge_broker::{deadline_sweep, PendingRequestStore, WorkError};

    #[test]
    fn test_single_winner_repeated_races() {
        let store = PendingRequestStore::new(Duration::from_secs(30));

        for round in 0..50 {
            let (correlation_id, rx) = store.register(None).unwrap();
            let barrier = Barrier::new(3);
            let store_ref = &store;

            let outcomes = std::thread::scope(|s| {
                let resolve = s.spawn(|| {
                    barrier.wait();
                    store_ref.resolve(correlation_id, serde_json::json!("value"))
                });
                let fail = s.spawn(|| {
                    barrier.wait();
                    store_ref.fail(
                        correlation_id,
                        WorkError::Worker {
                            code: 1,
                            message: "fault".into(),
                        },
                    )
                });
                let expire = s.spawn(|| {
                    barrier.wait();
                    store_ref.expire(correlation_id)
                });
                [
                    resolve.join().unwrap(),
                    fail.join().unwrap(),
                    expire.join().unwrap(),
                ]
            });

            let winners = outcomes.iter().filter(|&&won| won).count();
            assert_eq!(winners, 1, "round {round}: {winners} transitions won");
            assert!(store.is_empty());
            drop(rx);
        }

        // Every round ended in exactly one terminal state
        let stats = store.stats();
        let total = stats.fulfilled.load(Ordering::Relaxed)
            + stats.failed.load(Ordering::Relaxed)
            + stats.expired.load(Ordering::Relaxed);
        assert_eq!(total, 50);
    }

    #[tokio::test]
    async fn test_sweep_drains_mixed_deadlines() {
        let store = Arc::new(PendingRequestStore::new(Duration::from_secs(30)));
        let sweeper = tokio::spawn(deadline_sweep(store.clone(), Duration::from_millis(10)));

        let mut receivers = Vec::new();
        for n in 0..20u64 {
            let timeout = Duration::from_millis(10 + n * 3);
            let (_id, rx) = store.register(Some(timeout)).unwrap();
            receivers.push(rx);
        }
        assert_eq!(store.len(), 20);

        // Every receiver resolves to a timeout without anyone completing it
        for rx in receivers {
            let reply = tokio::time::timeout(Duration::from_secs(2), rx)
                .await
                .expect("sweep left a caller parked")
                .unwrap();
            assert!(matches!(reply.result, Err(WorkError::Timeout(_))));
        }

        assert!(store.is_empty());
        assert_eq!(store.stats().expired.load(Ordering::Relaxed), 20);

        sweeper.abort();
    }

    #[tokio::test]
    async fn test_resolution_after_sweep_is_refused() {
        let store = PendingRequestStore::new(Duration::from_secs(30));

        let (correlation_id, _rx) = store.register(Some(Duration::from_millis(10))).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.sweep_expired(), 1);

        // The late completion finds nothing to resurrect
        assert!(!store.resolve(correlation_id, serde_json::json!("late")));
        assert!(store.is_empty());
        assert_eq!(store.stats().fulfilled.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_abandoned_receiver_does_not_wedge_the_registry() {
        let store = Arc::new(PendingRequestStore::new(Duration::from_secs(30)));
        let sweeper = tokio::spawn(deadline_sweep(store.clone(), Duration::from_millis(10)));

        // Caller registers and walks away immediately
        {
            let (_id, rx) = store.register(Some(Duration::from_millis(20))).unwrap();
            drop(rx);
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.is_empty());
        assert_eq!(store.stats().expired.load(Ordering::Relaxed), 1);

        sweeper.abort();
    }
}
