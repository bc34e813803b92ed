//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering every synchronous failure mode of the relay.
///
/// Failures that happen while a request is running never surface here; they
/// are converted into an [`ExitOutcome`](crate::models::outcome::ExitOutcome)
/// and a visible message instead.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Worker process could not be launched.
    Launch(String),
    /// File-system or I/O operation failure.
    Io(String),
    /// A request is already in flight; the submission was rejected.
    Busy(String),
    /// Submitted input was rejected before reaching the worker.
    InvalidInput(String),
    /// The supervisor has shut down and accepts no more work.
    Shutdown(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Launch(msg) => write!(f, "launch: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Busy(msg) => write!(f, "busy: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Shutdown(msg) => write!(f, "shutdown: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
