//! Interpreter probing and caching.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use jpm_relay::config::InterpreterConfig;
use jpm_relay::runner::interpreter::{probe, resolve};
use jpm_relay::runner::CommandRunner;
use jpm_relay::RelayConfig;

const MISSING: &str = "jpm-relay-no-such-interpreter";

fn candidates(primary: &str, secondary: &str) -> InterpreterConfig {
    InterpreterConfig {
        primary: primary.into(),
        secondary: secondary.into(),
        fallback: "python".into(),
        version_flag: "--version".into(),
        probe_timeout_ms: 3_000,
    }
}

#[tokio::test]
async fn primary_wins_when_it_answers() {
    let chosen = resolve(&candidates("true", MISSING), &CancellationToken::new()).await;
    assert_eq!(chosen.program, "true");
    assert!(chosen.available);
}

#[tokio::test]
async fn secondary_used_when_primary_is_missing() {
    let chosen = resolve(&candidates(MISSING, "true"), &CancellationToken::new()).await;
    assert_eq!(chosen.program, "true");
    assert!(chosen.available);
}

#[tokio::test]
async fn fallback_used_when_no_candidate_answers() {
    let chosen = resolve(&candidates("false", MISSING), &CancellationToken::new()).await;
    assert_eq!(chosen.program, "python");
    assert!(!chosen.available, "fallback is never probed");
}

#[tokio::test]
async fn probe_times_out() {
    let started = Instant::now();
    let ok = probe(
        "sleep",
        "5",
        Duration::from_millis(100),
        &CancellationToken::new(),
    )
    .await;
    assert!(!ok);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn cancelled_probe_fails_fast() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    let ok = probe("sleep", "5", Duration::from_secs(10), &cancel).await;
    assert!(!ok);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn runner_probes_once_and_caches() {
    let config = RelayConfig {
        interpreter: candidates(MISSING, "true"),
        ..RelayConfig::default()
    };
    let runner = CommandRunner::new(Arc::new(config));
    let cancel = CancellationToken::new();

    let first = runner.interpreter(&cancel).await;
    let second = runner.interpreter(&cancel).await;

    assert_eq!(first.program, "true");
    assert!(std::ptr::eq(first, second));
}
