//! Per-request worker process launch and output streaming.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::OnceCell;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::models::invocation::Invocation;
use crate::models::outcome::{ExitKind, ExitOutcome, SYNTHETIC_EXIT_CODE};
use crate::runner::codec::{OutputCodec, OutputFrame};
use crate::runner::interpreter::{self, Interpreter};
use crate::{AppError, Result};

/// A single non-blank line of worker output, from stdout or stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    /// Decoded line without its terminator.
    pub text: String,
}

/// Launches one worker process per request.
///
/// The interpreter is resolved on first use and cached for the lifetime of
/// the runner.
#[derive(Debug)]
pub struct CommandRunner {
    config: Arc<RelayConfig>,
    interpreter: OnceCell<Interpreter>,
}

impl CommandRunner {
    /// Create a runner; no process is started until [`Self::spawn`].
    #[must_use]
    pub fn new(config: Arc<RelayConfig>) -> Self {
        Self {
            config,
            interpreter: OnceCell::new(),
        }
    }

    /// Create a runner with an already-resolved interpreter, skipping probes.
    #[must_use]
    pub fn with_interpreter(config: Arc<RelayConfig>, interpreter: Interpreter) -> Self {
        Self {
            config,
            interpreter: OnceCell::new_with(Some(interpreter)),
        }
    }

    /// Configuration the runner was built with.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Resolve the interpreter, probing candidates on the first call only.
    pub async fn interpreter(&self, cancel: &CancellationToken) -> &Interpreter {
        self.interpreter
            .get_or_init(|| interpreter::resolve(&self.config.interpreter, cancel))
            .await
    }

    /// Spawn `interpreter [script_args..] script_path <input>` for one request.
    ///
    /// The input travels as a single argument. Stdout and stderr are merged
    /// into the returned [`OutputStream`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Launch` if the script does not exist or the OS
    /// refuses to start the interpreter.
    pub async fn spawn(
        &self,
        invocation: &Invocation,
        cancel: CancellationToken,
    ) -> Result<OutputStream> {
        let interpreter = self.interpreter(&cancel).await.clone();
        let script = self.script_path();

        match tokio::fs::try_exists(&script).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(AppError::Launch(format!(
                    "script not found: {}",
                    script.display()
                )));
            }
            Err(err) => {
                return Err(AppError::Launch(format!(
                    "cannot access script {}: {err}",
                    script.display()
                )));
            }
        }

        let (reader, writer) = merged_output_pipe()?;

        let mut cmd = Command::new(&interpreter.program);
        cmd.args(&self.config.script_args)
            .arg(&script)
            .arg(&invocation.input)
            .stdin(Stdio::null())
            .stdout(writer.stdout)
            .stderr(writer.stderr)
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let spawned = cmd.spawn();
        // The command holds our copies of the write end; the reader only
        // sees EOF once they are closed.
        drop(cmd);
        let child = spawned.map_err(|err| {
            AppError::Launch(format!("failed to spawn {}: {err}", interpreter.program))
        })?;

        info!(
            seq = invocation.seq,
            invocation_id = invocation.id.as_str(),
            pid = child.id().unwrap_or(0),
            interpreter = interpreter.program.as_str(),
            "worker process spawned"
        );

        let codec = OutputCodec::with_max_length(self.config.max_line_bytes);
        Ok(OutputStream {
            seq: invocation.seq,
            child,
            frames: FramedRead::new(reader, codec),
            cancel,
            kill_grace: self.config.kill_grace(),
            interrupted: false,
            exhausted: false,
        })
    }

    fn script_path(&self) -> PathBuf {
        match &self.config.working_dir {
            Some(dir) if self.config.script_path.is_relative() => {
                dir.join(&self.config.script_path)
            }
            _ => self.config.script_path.clone(),
        }
    }
}

/// Live output of one worker process.
///
/// Lines are pulled lazily with [`Self::next_line`]; once it returns `None`
/// the caller collects the exit with [`Self::wait`]. Dropping the stream
/// kills the process.
pub struct OutputStream {
    seq: u64,
    child: Child,
    frames: FramedRead<pipe::Receiver, OutputCodec>,
    cancel: CancellationToken,
    kill_grace: Duration,
    interrupted: bool,
    exhausted: bool,
}

impl std::fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStream")
            .field("seq", &self.seq)
            .field("pid", &self.child.id())
            .field("interrupted", &self.interrupted)
            .finish_non_exhaustive()
    }
}

impl OutputStream {
    /// Next non-blank line, or `None` at end of output or on cancellation.
    ///
    /// Lines arrive in the order the worker wrote them, regardless of
    /// whether they went to stdout or stderr.
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        if self.interrupted || self.exhausted {
            return None;
        }

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    debug!(seq = self.seq, "output stream: cancellation received");
                    self.interrupted = true;
                    return None;
                }

                item = self.frames.next() => match item {
                    None => {
                        self.exhausted = true;
                        return None;
                    }
                    Some(Ok(OutputFrame::Line(text))) => {
                        if text.trim().is_empty() {
                            continue;
                        }
                        return Some(OutputLine { text });
                    }
                    Some(Ok(OutputFrame::Oversized)) => {
                        warn!(seq = self.seq, "output stream: over-long line skipped");
                    }
                    Some(Err(err)) => {
                        warn!(seq = self.seq, %err, "output stream: read error; no further output");
                        self.exhausted = true;
                        return None;
                    }
                },
            }
        }
    }

    /// Whether reading stopped because of cancellation.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Wait for the process to exit and classify the result.
    ///
    /// Cancellation before or during the wait stops the process and yields
    /// [`ExitKind::Interrupted`].
    pub async fn wait(mut self) -> ExitOutcome {
        if self.interrupted || self.cancel.is_cancelled() {
            self.terminate().await;
            return ExitOutcome::interrupted();
        }

        let result = tokio::select! {
            biased;

            () = self.cancel.cancelled() => None,
            status = self.child.wait() => Some(status),
        };

        let outcome = match result {
            None => {
                self.interrupted = true;
                self.terminate().await;
                ExitOutcome::interrupted()
            }
            Some(Ok(status)) => ExitOutcome::from_status(status),
            Some(Err(err)) => ExitOutcome {
                code: SYNTHETIC_EXIT_CODE,
                kind: ExitKind::NonZeroExit,
                reason: Some(format!("could not be waited on: {err}")),
            },
        };

        info!(seq = self.seq, exit_code = outcome.code, kind = ?outcome.kind, "worker process exited");
        outcome
    }

    /// Stop the process: SIGTERM, then a hard kill after the grace period.
    async fn terminate(&mut self) {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!(seq = self.seq, ?status, "worker already exited");
            return;
        }

        send_sigterm(&self.child);

        match tokio::time::timeout(self.kill_grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(seq = self.seq, ?status, "worker stopped after SIGTERM");
            }
            Ok(Err(err)) => {
                warn!(seq = self.seq, %err, "error waiting for worker after SIGTERM");
            }
            Err(_) => {
                warn!(seq = self.seq, "worker ignored SIGTERM, forcing kill");
                if let Err(err) = self.child.kill().await {
                    warn!(seq = self.seq, %err, "failed to force-kill worker");
                }
            }
        }
    }
}

/// Write ends handed to the child as stdout and stderr.
struct MergedWriter {
    stdout: Stdio,
    stderr: Stdio,
}

/// One anonymous pipe whose write end backs both stdout and stderr, so the
/// kernel keeps the interleaving the worker produced.
fn merged_output_pipe() -> Result<(pipe::Receiver, MergedWriter)> {
    let (reader, writer) = std::io::pipe()
        .map_err(|err| AppError::Launch(format!("failed to create output pipe: {err}")))?;
    let writer_err = writer
        .try_clone()
        .map_err(|err| AppError::Launch(format!("failed to clone output pipe: {err}")))?;
    let reader = pipe::Receiver::from_owned_fd(reader.into())
        .map_err(|err| AppError::Launch(format!("failed to register output pipe: {err}")))?;

    Ok((
        reader,
        MergedWriter {
            stdout: Stdio::from(writer),
            stderr: Stdio::from(writer_err),
        },
    ))
}

fn send_sigterm(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        debug!(pid, %err, "failed to send SIGTERM to worker");
    }
}
