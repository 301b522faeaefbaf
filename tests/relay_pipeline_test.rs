//! End-to-end relay tests: stream input through validation, the forward
//! pool, and the HTTP client into a mock destination.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{io::Cursor, sync::Arc, time::Duration};

use proptest::{prelude::*, test_runner::TestRunner};
use tokio_util::sync::CancellationToken;
use txrelay_delivery::{ClientConfig, ForwardClient, ForwardPool, PoolConfig};
use txrelay_ingest::{Dispatcher, Termination};
use txrelay_testing::{stream_input, MockDestination, RecordBuilder, TEST_AUTHORIZATION};

/// Runs `lines` through a full relay pointed at `destination`.
async fn relay(destination: &MockDestination, lines: Vec<String>) -> Termination {
    let client = ForwardClient::new(ClientConfig {
        destination_url: destination.url(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap();

    let mut pool = ForwardPool::new(
        PoolConfig { worker_count: 4, queue_capacity: 16 },
        Arc::new(client),
        CancellationToken::new(),
    );
    pool.spawn_workers();

    let mut dispatcher = Dispatcher::new(pool.queue());
    let reason = dispatcher.run_stream(Cursor::new(stream_input(lines))).await;

    pool.shutdown_graceful(Duration::from_secs(10)).await.unwrap();
    reason
}

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES").ok().and_then(|s| s.parse().ok()).unwrap_or(16);
    ProptestConfig { cases, failure_persistence: None, ..ProptestConfig::default() }
}

#[tokio::test]
async fn valid_record_is_forwarded_with_auth_and_canonical_body() {
    let destination = MockDestination::start().await;
    let line = r#"{"Resultcode":"0","Result":"OK","TxType":"A","TxId":"1","Extra":true}"#;

    let reason = relay(&destination, vec![line.to_string(), "done".to_string()]).await;

    assert_eq!(reason, Termination::Sentinel);
    let forwards = destination.received_forwards().await;
    assert_eq!(forwards.len(), 1);
    assert_eq!(forwards[0].authorization(), Some(TEST_AUTHORIZATION));
    assert_eq!(
        forwards[0].headers.get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
    assert_eq!(
        forwards[0].body.as_ref(),
        br#"{"TxId":"1","TxType":"A","Result":"OK","Resultcode":"0","Messages":{}}"#
    );
}

#[tokio::test]
async fn malformed_input_is_never_forwarded() {
    let destination = MockDestination::start().await;

    let reason = relay(&destination, vec!["not json".to_string(), "done".to_string()]).await;

    assert_eq!(reason, Termination::Sentinel);
    destination.assert_forward_count(0).await;
}

#[tokio::test]
async fn records_after_sentinel_are_ignored() {
    let destination = MockDestination::start().await;
    let lines = vec![
        RecordBuilder::with_defaults().tx_id("1").build_line(),
        "done".to_string(),
        RecordBuilder::with_defaults().tx_id("2").build_line(),
    ];

    relay(&destination, lines).await;

    let forwards = destination.received_forwards().await;
    assert_eq!(forwards.len(), 1);
    assert_eq!(forwards[0].json_body()["TxId"], "1");
}

#[tokio::test]
async fn destination_rejection_does_not_stop_the_stream() {
    let destination = MockDestination::start_empty().await;
    destination.require_test_credentials().await;

    let client = ForwardClient::new(ClientConfig {
        destination_url: destination.url(),
        password: "wrong".to_string(),
        ..Default::default()
    })
    .unwrap();
    let mut pool =
        ForwardPool::new(PoolConfig::default(), Arc::new(client), CancellationToken::new());
    pool.spawn_workers();
    let stats = pool.stats();

    let mut dispatcher = Dispatcher::new(pool.queue());
    let lines: Vec<String> = (0..3)
        .map(|id| RecordBuilder::with_defaults().tx_id(id.to_string()).build_line())
        .chain(std::iter::once("done".to_string()))
        .collect();
    dispatcher.run_stream(Cursor::new(stream_input(lines))).await;
    pool.shutdown_graceful(Duration::from_secs(10)).await.unwrap();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.submitted, 3);
    assert_eq!(snapshot.rejected, 3);
    assert_eq!(snapshot.delivered, 0);
}

#[tokio::test]
async fn unreachable_destination_drops_records_and_finishes() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ForwardClient::new(ClientConfig {
        destination_url: format!("http://{addr}/"),
        ..Default::default()
    })
    .unwrap();
    let mut pool =
        ForwardPool::new(PoolConfig::default(), Arc::new(client), CancellationToken::new());
    pool.spawn_workers();
    let stats = pool.stats();

    let mut dispatcher = Dispatcher::new(pool.queue());
    let input = stream_input([RecordBuilder::with_defaults().build_line().as_str(), "done"]);
    let reason = dispatcher.run_stream(Cursor::new(input)).await;
    pool.shutdown_graceful(Duration::from_secs(10)).await.unwrap();

    assert_eq!(reason, Termination::Sentinel);
    assert_eq!(stats.snapshot().failed, 1);
}

fn numeric() -> impl Strategy<Value = String> {
    "[-+]?[0-9]{1,6}(\\.[0-9]{1,3})?"
}

fn text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,:!-]{1,20}"
}

/// Every valid record yields exactly one forward whose body decodes to the
/// same fields; every record with a non-numeric id yields none.
#[test]
fn forwards_match_validity() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut runner = TestRunner::new(proptest_config());

    let strategy = (numeric(), text(), text(), numeric(), "[a-z]{1,5}", any::<bool>());

    runner
        .run(&strategy, |(tx_id, tx_type, result, result_code, bad_id, valid)| {
            rt.block_on(async {
                let destination = MockDestination::start().await;
                let id = if valid { tx_id.clone() } else { bad_id.clone() };
                let line = RecordBuilder::with_defaults()
                    .tx_id(id.clone())
                    .tx_type(tx_type.clone())
                    .result(result.clone())
                    .result_code(result_code.clone())
                    .build_line();

                relay(&destination, vec![line, "done".to_string()]).await;

                let forwards = destination.received_forwards().await;
                if valid {
                    prop_assert_eq!(forwards.len(), 1);
                    let body = forwards[0].json_body();
                    prop_assert_eq!(body["TxId"].as_str(), Some(id.as_str()));
                    prop_assert_eq!(body["TxType"].as_str(), Some(tx_type.as_str()));
                    prop_assert_eq!(body["Result"].as_str(), Some(result.as_str()));
                    prop_assert_eq!(body["Resultcode"].as_str(), Some(result_code.as_str()));
                } else {
                    prop_assert_eq!(forwards.len(), 0);
                }
                Ok(())
            })
        })
        .unwrap();
}
