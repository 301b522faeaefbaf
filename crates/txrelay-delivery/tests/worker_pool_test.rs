//! Forward pool concurrency and shutdown behavior.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use txrelay_delivery::{ClientConfig, ForwardClient, ForwardError, ForwardPool, PoolConfig};
use txrelay_testing::{MockDestination, RecordBuilder, RecordingForwarder};

fn record(id: usize) -> txrelay_core::ValidatedRecord {
    RecordBuilder::with_defaults().tx_id(id.to_string()).build_validated()
}

#[tokio::test]
async fn concurrency_never_exceeds_worker_count() {
    let forwarder = Arc::new(RecordingForwarder::with_delay(Duration::from_millis(20)));
    let mut pool = ForwardPool::new(
        PoolConfig { worker_count: 3, queue_capacity: 32 },
        forwarder.clone(),
        CancellationToken::new(),
    );
    pool.spawn_workers();
    let queue = pool.queue();

    for id in 0..20 {
        queue.submit(record(id)).await.unwrap();
    }

    pool.shutdown_graceful(Duration::from_secs(10)).await.unwrap();

    assert_eq!(forwarder.forward_count(), 20);
    assert!(forwarder.max_concurrent() <= 3, "max concurrent was {}", forwarder.max_concurrent());
    assert!(forwarder.max_concurrent() >= 2);
}

#[tokio::test]
async fn submit_waits_while_queue_is_full() {
    let forwarder = Arc::new(RecordingForwarder::new());
    let pool = ForwardPool::new(
        PoolConfig { worker_count: 1, queue_capacity: 2 },
        forwarder,
        CancellationToken::new(),
    );
    let queue = pool.queue();

    queue.submit(record(1)).await.unwrap();
    queue.submit(record(2)).await.unwrap();
    assert_eq!(queue.available_capacity(), 0);

    // No workers are running, so the third submit cannot complete
    let blocked = tokio::time::timeout(Duration::from_millis(100), queue.submit(record(3))).await;
    assert!(blocked.is_err());

    pool.shutdown_graceful(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn failed_forwards_are_counted_and_not_retried() {
    let forwarder = Arc::new(RecordingForwarder::failing());
    let mut pool = ForwardPool::new(
        PoolConfig { worker_count: 2, queue_capacity: 8 },
        forwarder.clone(),
        CancellationToken::new(),
    );
    pool.spawn_workers();
    let queue = pool.queue();
    let stats = pool.stats();

    for id in 0..5 {
        queue.submit(record(id)).await.unwrap();
    }
    pool.shutdown_graceful(Duration::from_secs(5)).await.unwrap();

    assert_eq!(forwarder.forward_count(), 5);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.failed, 5);
    assert_eq!(snapshot.delivered, 0);
}

#[tokio::test]
async fn shutdown_times_out_on_stuck_forwards() {
    let forwarder = Arc::new(RecordingForwarder::with_delay(Duration::from_secs(30)));
    let mut pool = ForwardPool::new(
        PoolConfig { worker_count: 1, queue_capacity: 4 },
        forwarder,
        CancellationToken::new(),
    );
    pool.spawn_workers();
    pool.queue().submit(record(1)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let result = pool.shutdown_graceful(Duration::from_millis(100)).await;

    assert!(matches!(result, Err(ForwardError::ShutdownTimeout { .. })));
}

#[tokio::test]
async fn cancellation_stops_workers_immediately() {
    let forwarder = Arc::new(RecordingForwarder::with_delay(Duration::from_secs(30)));
    let token = CancellationToken::new();
    let mut pool = ForwardPool::new(
        PoolConfig { worker_count: 2, queue_capacity: 4 },
        forwarder,
        token.clone(),
    );
    pool.spawn_workers();
    pool.queue().submit(record(1)).await.unwrap();

    token.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!pool.has_active_workers());
}

#[tokio::test]
async fn pool_forwards_every_record_to_destination() {
    let destination = MockDestination::start().await;
    let client = ForwardClient::new(ClientConfig {
        destination_url: destination.url(),
        ..Default::default()
    })
    .unwrap();

    let mut pool = ForwardPool::new(
        PoolConfig { worker_count: 4, queue_capacity: 16 },
        Arc::new(client),
        CancellationToken::new(),
    );
    pool.spawn_workers();
    let queue = pool.queue();
    let stats = pool.stats();

    for id in 0..12 {
        queue.submit(record(id)).await.unwrap();
    }
    pool.shutdown_graceful(Duration::from_secs(10)).await.unwrap();

    destination.assert_forward_count(12).await;
    assert_eq!(stats.snapshot().delivered, 12);

    let mut ids: Vec<String> = destination
        .received_forwards()
        .await
        .iter()
        .map(|forward| forward.json_body()["TxId"].as_str().unwrap().to_string())
        .collect();
    ids.sort_by_key(|id| id.parse::<u32>().unwrap());
    let expected: Vec<String> = (0..12).map(|id| id.to_string()).collect();
    assert_eq!(ids, expected);
}
