//! Probe suite behavior against a fake backend

mod support;

use std::net::SocketAddr;
use std::time::Duration;

use paasport_harness::api::{ApiConfig, ApiProber};

fn config_for(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        base_url: format!("http://{}", addr),
        timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

#[tokio::test]
async fn all_probes_pass_against_a_healthy_backend() {
    let state = support::FakeBackend::healthy();
    let addr = support::serve(state).await;

    let prober = ApiProber::new(config_for(addr)).unwrap();
    let report = prober.run_all().await;

    assert!(report.all_passed(), "{:?}", report);
    assert_eq!(report.passed(), report.total());
}

#[tokio::test]
async fn failing_health_marks_connectivity_without_stopping_the_suite() {
    let state = support::FakeBackend::with(false, true);
    let addr = support::serve(state).await;

    let prober = ApiProber::new(config_for(addr)).unwrap();
    let report = prober.run_all().await;

    assert!(!report.connectivity.success);
    assert!(report
        .connectivity
        .error
        .as_deref()
        .unwrap()
        .contains("500"));

    // the rest of the suite still ran and passed
    assert!(report.authentication.success);
    assert!(report.applications.success);
    assert!(report.graphql.success);
    assert_eq!(report.passed(), report.total() - 1);
}

#[tokio::test]
async fn missing_token_fails_authentication_but_later_probes_still_run() {
    let state = support::FakeBackend::with(true, false);
    let addr = support::serve(state.clone()).await;

    let prober = ApiProber::new(config_for(addr)).unwrap();
    let report = prober.run_all().await;

    assert!(!report.authentication.success);
    assert!(report
        .authentication
        .error
        .as_deref()
        .unwrap()
        .contains("no token field"));

    // dependent probes were attempted, not skipped
    assert!(state.application_hits() > 0);
    assert!(report.applications.success);
}

#[tokio::test]
async fn unreachable_backend_fails_every_probe_with_messages() {
    // bind then drop to get a port with no listener
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = config_for(addr);
    config.timeout = Duration::from_secs(1);
    let prober = ApiProber::new(config).unwrap();
    let report = prober.run_all().await;

    assert_eq!(report.passed(), 0);
    for (name, outcome) in report.outcomes() {
        assert!(outcome.error.is_some(), "{} has no error message", name);
    }
}
