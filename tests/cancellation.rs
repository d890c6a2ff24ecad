//! Caller cancellation and deadlines

mod common;

use common::{Behavior, harness, prompt, provider};
use std::time::Duration;
use switchyard::error::RouterError;
use switchyard::metrics::GenerationOutcome;
use tokio_test::{assert_pending, assert_ready_ok, task};

#[tokio::test]
async fn test_deadline_stops_failover() {
    let h = harness(&[
        provider("alpha", 100).always(Behavior::Hang),
        provider("beta", 100),
    ]);

    let err = h
        .router
        .generate_with_cancellation(&prompt(), tokio::time::sleep(Duration::from_millis(20)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RouterError::Cancelled { provider: Some(ref p) } if p == "alpha"
    ));
    assert_eq!(h.calls(), vec!["alpha"], "beta must not be tried after cancellation");
    assert_eq!(h.metrics.generations_count(GenerationOutcome::Cancelled), 1);
}

#[tokio::test]
async fn test_already_cancelled_makes_no_attempt() {
    let h = harness(&[provider("alpha", 100)]);

    let err = h
        .router
        .generate_with_cancellation(&prompt(), std::future::ready(()))
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::Cancelled { provider: None }));
    assert!(h.calls().is_empty());
    assert_eq!(h.router.cursor(), 0);
}

#[tokio::test]
async fn test_cancel_after_failure_skips_remaining_providers() {
    let h = harness(&[
        provider("alpha", 100).always(Behavior::Transport),
        provider("beta", 100).always(Behavior::Hang),
        provider("gamma", 100),
    ]);

    let err = h
        .router
        .generate_with_cancellation(&prompt(), tokio::time::sleep(Duration::from_millis(20)))
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::Cancelled { provider: Some(ref p) } if p == "beta"));
    assert_eq!(h.calls(), vec!["alpha", "beta"]);
}

#[test]
fn test_dropping_generate_abandons_in_flight_call() {
    let h = harness(&[provider("alpha", 100).always(Behavior::Hang)]);
    let request = prompt();

    {
        let mut call = task::spawn(h.router.generate(&request));
        assert_pending!(call.poll());
        assert_pending!(call.poll());
    }

    // The attempt was recorded before the call went out
    let snapshot = h.router.snapshot();
    assert_eq!(snapshot.providers[0].recent_attempts, 1);
    assert_eq!(h.calls(), vec!["alpha"]);
}

#[test]
fn test_generate_completes_without_runtime_when_adapter_is_ready() {
    let h = harness(&[provider("alpha", 100)]);
    let request = prompt();

    let mut call = task::spawn(h.router.generate(&request));
    let response = assert_ready_ok!(call.poll());
    assert_eq!(response.provider_name, "alpha");
}
