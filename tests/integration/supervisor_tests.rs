//! Worker pool lifecycle tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jpm_relay::supervisor::ProcessSupervisor;
use jpm_relay::{AppError, RelayConfig};

fn config(shutdown_grace_ms: u64) -> RelayConfig {
    RelayConfig {
        shutdown_grace_ms,
        worker_threads: 2,
        ..RelayConfig::default()
    }
}

#[test]
fn shutdown_is_idempotent() {
    let supervisor = ProcessSupervisor::new(&config(500)).expect("supervisor");
    assert!(!supervisor.is_shut_down());

    supervisor.shutdown();
    supervisor.shutdown();
    assert!(supervisor.is_shut_down());
}

#[test]
fn idle_shutdown_is_quick() {
    let supervisor = ProcessSupervisor::new(&config(2_000)).expect("supervisor");
    let started = Instant::now();
    supervisor.shutdown();
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn spawn_after_shutdown_is_rejected() {
    let supervisor = ProcessSupervisor::new(&config(500)).expect("supervisor");
    supervisor.shutdown();

    match supervisor.spawn(async {}) {
        Err(AppError::Shutdown(_)) => {}
        other => panic!("expected shutdown error, got {other:?}"),
    }
}

#[test]
fn tasks_observe_cancellation_before_pool_stops() {
    let supervisor = ProcessSupervisor::new(&config(2_000)).expect("supervisor");
    let token = supervisor.cancel_token();
    let cleaned_up = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&cleaned_up);
    supervisor
        .spawn(async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        })
        .expect("spawn");
    assert_eq!(supervisor.active_tasks(), 1);

    supervisor.shutdown();
    assert!(cleaned_up.load(Ordering::SeqCst));
    assert_eq!(supervisor.active_tasks(), 0);
}

#[test]
fn shutdown_is_bounded_when_a_task_ignores_cancellation() {
    let supervisor = ProcessSupervisor::new(&config(200)).expect("supervisor");
    supervisor
        .spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        })
        .expect("spawn");

    let started = Instant::now();
    supervisor.shutdown();
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "shutdown took {:?}",
        started.elapsed()
    );
}

#[test]
fn block_on_runs_on_the_pool() {
    let supervisor = ProcessSupervisor::new(&config(500)).expect("supervisor");
    let value = supervisor.block_on(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        42
    });
    assert_eq!(value, 42);
}
