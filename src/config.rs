//! Relay configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Interpreter discovery settings.
///
/// The runner probes `primary`, then `secondary`, and settles on `fallback`
/// without probing when neither answers the version flag.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InterpreterConfig {
    /// First candidate probed.
    #[serde(default = "default_primary")]
    pub primary: String,
    /// Second candidate probed when the primary is unavailable.
    #[serde(default = "default_secondary")]
    pub secondary: String,
    /// Used unprobed when both candidates fail.
    #[serde(default = "default_fallback")]
    pub fallback: String,
    /// Flag passed to a candidate during probing.
    #[serde(default = "default_version_flag")]
    pub version_flag: String,
    /// Upper bound on a single probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            secondary: default_secondary(),
            fallback: default_fallback(),
            version_flag: default_version_flag(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl InterpreterConfig {
    /// Probe timeout as a [`Duration`].
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn default_primary() -> String {
    "python3".into()
}

fn default_secondary() -> String {
    "python".into()
}

fn default_fallback() -> String {
    "python".into()
}

fn default_version_flag() -> String {
    "--version".into()
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_script_path() -> PathBuf {
    PathBuf::from("jpm_nlp.py")
}

fn default_max_line_bytes() -> usize {
    1_048_576
}

fn default_kill_grace_ms() -> u64 {
    500
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}

fn default_worker_threads() -> usize {
    2
}

fn default_log_level() -> String {
    "info".into()
}

/// Top-level configuration parsed from `relay.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RelayConfig {
    /// Interpreter discovery.
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    /// Worker script handed to the interpreter.
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,
    /// Extra interpreter arguments placed before the script path.
    #[serde(default)]
    pub script_args: Vec<String>,
    /// Working directory for spawned workers; inherits ours when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Longest output line accepted from a worker.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Time between SIGTERM and a hard kill when stopping a worker.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
    /// Upper bound on how long shutdown waits for in-flight requests.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Threads in the supervisor's worker pool.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Log verbosity as an `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            interpreter: InterpreterConfig::default(),
            script_path: default_script_path(),
            script_args: Vec::new(),
            working_dir: None,
            max_line_bytes: default_max_line_bytes(),
            kill_grace_ms: default_kill_grace_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            worker_threads: default_worker_threads(),
            log_level: default_log_level(),
        }
    }
}

impl RelayConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Grace period between SIGTERM and a hard kill.
    #[must_use]
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    /// Bound on how long shutdown waits for in-flight requests.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Check invariants that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.script_path.as_os_str().is_empty() {
            return Err(AppError::Config("script_path must not be empty".into()));
        }

        let names = [
            ("interpreter.primary", &self.interpreter.primary),
            ("interpreter.secondary", &self.interpreter.secondary),
            ("interpreter.fallback", &self.interpreter.fallback),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{field} must not be empty")));
            }
        }

        if self.max_line_bytes == 0 {
            return Err(AppError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        if self.worker_threads == 0 {
            return Err(AppError::Config(
                "worker_threads must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
