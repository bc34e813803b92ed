//! Exit outcome of a worker process run.

use std::fmt::{Display, Formatter};
use std::process::ExitStatus;

use serde::{Deserialize, Serialize};

/// Exit code reported when no real process status exists.
pub const SYNTHETIC_EXIT_CODE: i32 = -1;

/// How a worker run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    /// Process ran and exited with code 0.
    Normal,
    /// Process ran and signaled failure.
    NonZeroExit,
    /// Interpreter or script could not be launched.
    LaunchFailure,
    /// The run was cancelled before the process finished.
    Interrupted,
}

/// Exit code plus its classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ExitOutcome {
    /// Process exit code; [`SYNTHETIC_EXIT_CODE`] when the process never
    /// produced one.
    pub code: i32,
    /// Classification of the exit.
    pub kind: ExitKind,
    /// Extra context for failures, such as the OS launch error.
    pub reason: Option<String>,
}

impl ExitOutcome {
    /// Classify a finished process status.
    ///
    /// A process killed by a signal has no exit code and is reported as a
    /// non-zero exit with [`SYNTHETIC_EXIT_CODE`].
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => Self::normal(),
            Some(code) => Self {
                code,
                kind: ExitKind::NonZeroExit,
                reason: None,
            },
            None => Self {
                code: SYNTHETIC_EXIT_CODE,
                kind: ExitKind::NonZeroExit,
                reason: Some("terminated by signal".into()),
            },
        }
    }

    /// Successful exit.
    #[must_use]
    pub fn normal() -> Self {
        Self {
            code: 0,
            kind: ExitKind::Normal,
            reason: None,
        }
    }

    /// The process could not be started.
    #[must_use]
    pub fn launch_failure(reason: impl Into<String>) -> Self {
        Self {
            code: SYNTHETIC_EXIT_CODE,
            kind: ExitKind::LaunchFailure,
            reason: Some(reason.into()),
        }
    }

    /// The run was cancelled.
    #[must_use]
    pub fn interrupted() -> Self {
        Self {
            code: SYNTHETIC_EXIT_CODE,
            kind: ExitKind::Interrupted,
            reason: None,
        }
    }

    /// Whether the process exited cleanly.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == ExitKind::Normal
    }

    /// Visible error line for failed runs; `None` on success.
    #[must_use]
    pub fn error_line(&self) -> Option<String> {
        match self.kind {
            ExitKind::Normal => None,
            ExitKind::NonZeroExit => Some(match &self.reason {
                Some(reason) => format!("Error: worker process {reason}"),
                None => format!("Error: worker process exited with code {}", self.code),
            }),
            ExitKind::LaunchFailure => Some(match &self.reason {
                Some(reason) => format!("Error: could not start worker process: {reason}"),
                None => "Error: could not start worker process".to_owned(),
            }),
            ExitKind::Interrupted => Some("Error: request interrupted".to_owned()),
        }
    }
}

impl Display for ExitOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ExitKind::Normal => write!(f, "exited normally (code 0)"),
            ExitKind::NonZeroExit => write!(f, "exited with code {}", self.code),
            ExitKind::LaunchFailure => write!(f, "launch failure"),
            ExitKind::Interrupted => write!(f, "interrupted"),
        }
    }
}
