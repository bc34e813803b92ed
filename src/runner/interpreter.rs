//! Interpreter discovery.
//!
//! A probe spawns the candidate with the configured version flag and counts
//! as a success only when it exits with code 0 inside the probe timeout.
//! Spawn errors, timeouts, and cancellation are all probe failures.

use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::InterpreterConfig;

/// Resolved interpreter executable.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Interpreter {
    /// Executable name or path.
    pub program: String,
    /// Whether a probe confirmed the executable answers.
    pub available: bool,
}

/// Probe the configured candidates in order and pick the first that answers.
///
/// Falls back to `config.fallback`, marked unavailable, when neither
/// candidate passes. The fallback is not probed; launching it may still
/// fail, which the runner reports as a launch failure.
pub async fn resolve(config: &InterpreterConfig, cancel: &CancellationToken) -> Interpreter {
    let timeout = config.probe_timeout();

    for candidate in [&config.primary, &config.secondary] {
        if probe(candidate, &config.version_flag, timeout, cancel).await {
            info!(interpreter = candidate.as_str(), "interpreter resolved");
            return Interpreter {
                program: candidate.clone(),
                available: true,
            };
        }
    }

    warn!(
        primary = config.primary.as_str(),
        secondary = config.secondary.as_str(),
        fallback = config.fallback.as_str(),
        "no interpreter candidate answered; using fallback"
    );
    Interpreter {
        program: config.fallback.clone(),
        available: false,
    }
}

/// Run `candidate <version_flag>` and report whether it exited with code 0.
pub async fn probe(
    candidate: &str,
    version_flag: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> bool {
    let mut cmd = Command::new(candidate);
    cmd.arg(version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!(candidate, %err, "interpreter probe failed to spawn");
            return false;
        }
    };

    tokio::select! {
        () = cancel.cancelled() => {
            debug!(candidate, "interpreter probe cancelled");
            false
        }
        result = tokio::time::timeout(timeout, child.wait()) => match result {
            Ok(Ok(status)) => {
                debug!(candidate, ?status, "interpreter probe finished");
                status.success()
            }
            Ok(Err(err)) => {
                debug!(candidate, %err, "interpreter probe wait failed");
                false
            }
            Err(_elapsed) => {
                debug!(candidate, ?timeout, "interpreter probe timed out");
                false
            }
        },
    }
}
