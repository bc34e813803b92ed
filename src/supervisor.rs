//! Worker pool ownership and shutdown coordination.
//!
//! The supervisor owns a multi-thread tokio runtime that runs every request
//! task. Tasks are tracked with a [`TaskTracker`] and observe a shared
//! [`CancellationToken`]; shutdown cancels the token, gives tasks a bounded
//! window to stop their workers and report `Interrupted`, then drops the
//! runtime. Worker processes are spawned with `kill_on_drop`, so a task torn
//! down at that point still takes its process with it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::{AppError, Result};

/// Owner of the request worker pool.
#[derive(Debug)]
pub struct ProcessSupervisor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    tracker: TaskTracker,
    cancel: CancellationToken,
    shutdown_grace: Duration,
    shut_down: AtomicBool,
}

impl ProcessSupervisor {
    /// Build the worker pool described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the runtime cannot be created.
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("jpm-relay-worker")
            .enable_all()
            .build()
            .map_err(|err| AppError::Io(format!("failed to build worker pool: {err}")))?;
        let handle = runtime.handle().clone();

        info!(worker_threads = config.worker_threads, "worker pool started");

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            handle,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            shutdown_grace: config.shutdown_grace(),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Token that fires when the supervisor shuts down.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Whether [`Self::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Number of tasks still running.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Run `task` on the worker pool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Shutdown` once the supervisor has shut down; the
    /// task is dropped unpolled.
    pub fn spawn<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            return Err(AppError::Shutdown("worker pool is shut down".into()));
        }
        drop(self.tracker.spawn_on(task, &self.handle));
        Ok(())
    }

    /// Drive `future` to completion on the worker pool from a non-async thread.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }

    /// Cancel all work immediately and reclaim the worker pool.
    ///
    /// Waits at most the configured shutdown grace for tasks to finish their
    /// cleanup, so it never blocks indefinitely. Idempotent. When called from
    /// inside an async context it cannot block at all; tasks are then dropped
    /// and report `Interrupted` from their drop path.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(active = self.tracker.len(), "supervisor shutting down");
        self.cancel.cancel();
        self.tracker.close();

        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(runtime) = runtime else {
            return;
        };

        if Handle::try_current().is_ok() {
            warn!("shutdown called from an async context; dropping tasks without waiting");
            runtime.shutdown_background();
            return;
        }

        let tracker = self.tracker.clone();
        let grace = self.shutdown_grace;
        let drained = runtime.block_on(async move {
            tokio::time::timeout(grace, tracker.wait()).await.is_ok()
        });

        if drained {
            info!("all request tasks finished");
            runtime.shutdown_timeout(grace);
        } else {
            warn!(
                remaining = self.tracker.len(),
                ?grace,
                "request tasks still running after grace; dropping them"
            );
            runtime.shutdown_background();
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
