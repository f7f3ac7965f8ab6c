//! Readiness poller timing behavior

mod support;

use std::time::{Duration, Instant};

use paasport_common::Error;
use paasport_harness::readiness::wait_for_url;

#[tokio::test]
async fn ready_url_resolves_immediately() {
    let addr = support::serve(support::FakeBackend::healthy()).await;

    wait_for_url(
        &format!("http://{}/health", addr),
        Duration::from_secs(5),
        Duration::from_millis(100),
    )
    .await
    .expect("healthy endpoint should resolve");
}

#[tokio::test]
async fn non_2xx_responses_keep_polling_until_timeout() {
    let addr = support::serve(support::FakeBackend::with(false, true)).await;

    let err = wait_for_url(
        &format!("http://{}/health", addr),
        Duration::from_millis(600),
        Duration::from_millis(200),
    )
    .await
    .expect_err("500s never satisfy the poller");

    assert!(matches!(err, Error::ReadinessTimeout { .. }), "{}", err);
}

#[tokio::test]
async fn unreachable_url_times_out_within_one_interval() {
    // bind then drop to get a port with no listener
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = format!("http://127.0.0.1:{}/health", port);
    let total = Duration::from_secs(1);
    let interval = Duration::from_millis(200);

    let start = Instant::now();
    let err = wait_for_url(&url, total, interval)
        .await
        .expect_err("nothing listens there");
    let elapsed = start.elapsed();

    assert!(matches!(err, Error::ReadinessTimeout { .. }), "{}", err);
    assert!(elapsed >= total, "gave up too early: {:?}", elapsed);
    assert!(
        elapsed <= total + interval + Duration::from_millis(500),
        "overshot the budget: {:?}",
        elapsed
    );
}
