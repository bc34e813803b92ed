//! Session controller: accepts submissions and runs them on the worker pool.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::models::invocation::Invocation;
use crate::models::outcome::ExitOutcome;
use crate::models::session::{SessionEvent, SessionState};
use crate::protocol::classify_line;
use crate::runner::CommandRunner;
use crate::session::machine::{EventSink, RequestMachine, SessionSlot};
use crate::supervisor::ProcessSupervisor;
use crate::{AppError, Result};

/// Owns the single request slot and fans worker output out to subscribers.
///
/// Notifications are delivered over the channel returned by [`Self::new`],
/// in emission order. The controller makes no assumption about which thread
/// consumes them.
#[derive(Debug)]
pub struct SessionController {
    runner: Arc<CommandRunner>,
    supervisor: Arc<ProcessSupervisor>,
    slot: Arc<SessionSlot>,
    sink: EventSink,
}

impl SessionController {
    /// Create an idle controller and the receiver for its notifications.
    #[must_use]
    pub fn new(
        runner: Arc<CommandRunner>,
        supervisor: Arc<ProcessSupervisor>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sink, rx) = EventSink::channel();
        let controller = Self {
            runner,
            supervisor,
            slot: Arc::new(SessionSlot::new()),
            sink,
        };
        (controller, rx)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.slot.state()
    }

    /// Sequence number of the invocation that owns the session, if any.
    #[must_use]
    pub fn current(&self) -> Option<u64> {
        self.slot.owner()
    }

    /// Submit one request. Returns the invocation's sequence number.
    ///
    /// On acceptance the session turns busy, `Busy { busy: true }` is
    /// published, and the worker runs on the supervisor's pool.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidInput` for empty or whitespace-only text.
    /// - `AppError::Shutdown` after the supervisor has shut down.
    /// - `AppError::Busy` while another invocation owns the session; the
    ///   running invocation is unaffected.
    pub fn submit(&self, text: &str) -> Result<u64> {
        let input = text.trim();
        if input.is_empty() {
            return Err(AppError::InvalidInput("input is empty".into()));
        }
        if self.supervisor.is_shut_down() {
            return Err(AppError::Shutdown("session controller is shut down".into()));
        }

        let invocation = Invocation::new(input.to_owned());
        let seq = invocation.seq;

        if !self.slot.try_acquire(seq) {
            let owner = self.slot.owner().unwrap_or_default();
            debug!(seq, owner, "submission rejected while busy");
            return Err(AppError::Busy(format!("request {owner} is still running")));
        }

        info!(seq, invocation_id = invocation.id.as_str(), "request accepted");
        self.sink.emit(SessionEvent::Busy { busy: true });

        let machine = RequestMachine::new(seq, Arc::clone(&self.slot), self.sink.clone());
        let span = info_span!("invocation", seq, invocation_id = %invocation.id);
        let task = run_invocation(
            Arc::clone(&self.runner),
            invocation,
            machine,
            self.supervisor.cancel_token(),
        )
        .instrument(span);

        // A failed spawn drops the task, and with it the machine, which
        // reports the invocation as interrupted.
        if let Err(err) = self.supervisor.spawn(task) {
            warn!(seq, %err, "request could not be scheduled");
        }

        Ok(seq)
    }
}

async fn run_invocation(
    runner: Arc<CommandRunner>,
    invocation: Invocation,
    mut machine: RequestMachine,
    cancel: CancellationToken,
) {
    let outcome = match runner.spawn(&invocation, cancel.clone()).await {
        Ok(mut output) => {
            while let Some(line) = output.next_line().await {
                debug!(line = line.text.as_str(), "worker line");
                if let Some(event) = classify_line(&line.text) {
                    machine.on_event(event);
                }
            }
            if output.is_interrupted() {
                info!("request cancelled while reading worker output");
            }
            output.wait().await
        }
        Err(_) if cancel.is_cancelled() => ExitOutcome::interrupted(),
        Err(err) => {
            warn!(%err, "worker launch failed");
            let reason = match err {
                AppError::Launch(msg) => msg,
                other => other.to_string(),
            };
            ExitOutcome::launch_failure(reason)
        }
    };

    info!(exit_code = outcome.code, kind = ?outcome.kind, "request finished");
    machine.on_exit(outcome);
}
