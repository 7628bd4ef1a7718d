//! # Broker Integration Flows
//!
//! End-to-end roundtrips over the in-memory queue: a caller dispatches
//! work, a simulated worker tier consumes the `Work` topic and publishes
//! completions, and the broker resumes the caller exactly once.
//!
//! The worker simulations mirror the production worker loop: receive an
//! order, compute, publish a completion carrying the same correlation ID.

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use bridge_broker::{BrokerConfig, BrokerService, WorkError};
    use rand::Rng;
    use shared_queue::{
        CompletionNotice, InMemoryQueue, MessageFilter, QueueMessage, QueuePublisher, QueueTopic,
        WorkerFault,
    };
    use tokio::task::JoinHandle;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn started_service(queue: &Arc<InMemoryQueue>) -> BrokerService {
        crate::init_tracing();
        let mut service = BrokerService::new(BrokerConfig::default(), queue.clone())
            .expect("default config is valid");
        service.start().expect("fresh service starts");
        service
    }

    fn completion_for(order_id: String, result: Result<serde_json::Value, WorkerFault>) -> QueueMessage {
        QueueMessage::Completion(CompletionNotice {
            correlation_id: order_id,
            worker: "sim-worker".into(),
            result,
            received_at_ms: 0,
            completed_at_ms: 0,
        })
    }

    /// Worker that completes every order with its own payload, optionally
    /// after a delay, optionally publishing every completion twice.
    fn spawn_echo_worker(
        queue: Arc<InMemoryQueue>,
        delay: Option<Duration>,
        duplicates: bool,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut sub = queue.subscribe(MessageFilter::topics(vec![QueueTopic::Work]));
            while let Some(QueueMessage::Work(order)) = sub.recv().await {
                let queue = queue.clone();
                tokio::spawn(async move {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    let notice =
                        completion_for(order.correlation_id.clone(), Ok(order.payload.clone()));
                    queue.publish(notice.clone()).await;
                    if duplicates {
                        queue.publish(notice).await;
                    }
                });
            }
        })
    }

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test]
    async fn test_dispatch_roundtrip() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = started_service(&queue);
        let worker = spawn_echo_worker(queue.clone(), None, false);

        let payload = serde_json::json!({"s3_key": "cat.jpeg"});
        let result = service.dispatch(payload.clone(), None).await.unwrap();

        assert_eq!(result, payload);
        assert_eq!(service.pending_count(), 0);
        assert_eq!(service.stats().fulfilled.load(Ordering::Relaxed), 1);

        worker.abort();
    }

    #[tokio::test]
    async fn test_worker_fault_reaches_caller() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = started_service(&queue);

        let worker_queue = queue.clone();
        let worker = tokio::spawn(async move {
            let mut sub = worker_queue.subscribe(MessageFilter::topics(vec![QueueTopic::Work]));
            while let Some(QueueMessage::Work(order)) = sub.recv().await {
                worker_queue
                    .publish(completion_for(
                        order.correlation_id,
                        Err(WorkerFault {
                            code: 507,
                            message: "disk full".into(),
                        }),
                    ))
                    .await;
            }
        });

        let err = service
            .dispatch(serde_json::json!(null), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WorkError::Worker {
                code: 507,
                message: "disk full".into()
            }
        );
        assert_eq!(service.pending_count(), 0);

        worker.abort();
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    #[tokio::test]
    async fn test_completions_out_of_submission_order() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = Arc::new(started_service(&queue));

        // Worker that batches two orders, then answers them in reverse
        let worker_queue = queue.clone();
        let worker = tokio::spawn(async move {
            let mut sub = worker_queue.subscribe(MessageFilter::topics(vec![QueueTopic::Work]));
            let mut batch = Vec::new();
            while batch.len() < 2 {
                if let Some(QueueMessage::Work(order)) = sub.recv().await {
                    batch.push(order);
                }
            }
            for order in batch.into_iter().rev() {
                worker_queue
                    .publish(completion_for(order.correlation_id, Ok(order.payload)))
                    .await;
            }
        });

        let (first, second) = tokio::join!(
            service.dispatch(serde_json::json!("first"), None),
            service.dispatch(serde_json::json!("second"), None),
        );

        // Each caller gets its own answer regardless of delivery order
        assert_eq!(first.unwrap(), serde_json::json!("first"));
        assert_eq!(second.unwrap(), serde_json::json!("second"));
        assert_eq!(service.pending_count(), 0);

        worker.abort();
    }

    #[tokio::test]
    async fn test_many_callers_with_jittered_workers() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = Arc::new(started_service(&queue));

        // Per-order random latency scrambles completion order
        let worker_queue = queue.clone();
        let worker = tokio::spawn(async move {
            let mut sub = worker_queue.subscribe(MessageFilter::topics(vec![QueueTopic::Work]));
            while let Some(QueueMessage::Work(order)) = sub.recv().await {
                let queue = worker_queue.clone();
                let delay = Duration::from_millis(rand::thread_rng().gen_range(0..40));
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    queue
                        .publish(completion_for(order.correlation_id, Ok(order.payload)))
                        .await;
                });
            }
        });

        let mut callers = Vec::new();
        for n in 0..8 {
            let service = service.clone();
            callers.push(tokio::spawn(async move {
                let result = service.dispatch(serde_json::json!(n), None).await;
                (n, result)
            }));
        }

        for caller in callers {
            let (n, result) = caller.await.unwrap();
            assert_eq!(result.unwrap(), serde_json::json!(n));
        }
        assert_eq!(service.pending_count(), 0);

        worker.abort();
    }

    // =========================================================================
    // TIMEOUTS AND LEAKS
    // =========================================================================

    #[tokio::test]
    async fn test_timeout_without_any_worker() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = started_service(&queue);

        let timeout = Duration::from_millis(500);
        let started = Instant::now();
        let err = service
            .dispatch(serde_json::json!(null), Some(timeout))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err, WorkError::Timeout(timeout));
        assert!(elapsed >= timeout, "resolved early: {elapsed:?}");
        assert!(elapsed < timeout * 3, "resolved far too late: {elapsed:?}");
        assert_eq!(service.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_no_leak_after_batch_of_timeouts() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = Arc::new(started_service(&queue));

        let mut callers = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            callers.push(tokio::spawn(async move {
                service
                    .dispatch(serde_json::json!(null), Some(Duration::from_millis(100)))
                    .await
            }));
        }

        for caller in callers {
            assert!(matches!(caller.await.unwrap(), Err(WorkError::Timeout(_))));
        }

        // Every abandoned entry is gone, not parked forever
        assert_eq!(service.pending_count(), 0);
        assert_eq!(service.stats().registered.load(Ordering::Relaxed), 10);
        assert_eq!(service.stats().expired.load(Ordering::Relaxed), 10);
    }

    // =========================================================================
    // DUPLICATE, LATE, AND STRAY DELIVERIES
    // =========================================================================

    #[tokio::test]
    async fn test_duplicate_completion_resolves_once() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = started_service(&queue);
        let worker = spawn_echo_worker(queue.clone(), None, true);

        let result = service.dispatch(serde_json::json!("cat"), None).await;
        assert_eq!(result.unwrap(), serde_json::json!("cat"));

        // Give the duplicate time to arrive and be discarded
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.pending_count(), 0);
        assert_eq!(service.stats().fulfilled.load(Ordering::Relaxed), 1);

        worker.abort();
    }

    #[tokio::test]
    async fn test_late_completion_after_timeout_is_harmless() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = started_service(&queue);
        let worker = spawn_echo_worker(queue.clone(), Some(Duration::from_millis(250)), false);

        let err = service
            .dispatch(serde_json::json!("slow"), Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::Timeout(_)));

        // The completion lands well after expiry and must change nothing
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(service.pending_count(), 0);
        assert_eq!(service.stats().fulfilled.load(Ordering::Relaxed), 0);
        assert_eq!(service.stats().expired.load(Ordering::Relaxed), 1);

        worker.abort();
    }

    #[tokio::test]
    async fn test_stray_completion_for_unknown_id() {
        let queue = Arc::new(InMemoryQueue::new());
        let service = Arc::new(started_service(&queue));

        // Park one real caller so the registry is non-empty
        let parked = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .dispatch(serde_json::json!(null), Some(Duration::from_millis(400)))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.pending_count(), 1);

        // A completion nobody asked for
        queue
            .publish(completion_for(
                uuid::Uuid::now_v7().to_string(),
                Ok(serde_json::json!("stray")),
            ))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.pending_count(), 1, "stray delivery touched the registry");

        assert!(matches!(parked.await.unwrap(), Err(WorkError::Timeout(_))));
    }
}
