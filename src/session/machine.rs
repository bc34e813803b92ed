//! Busy/idle state machine driven by classified worker output.
//!
//! [`SessionSlot`] is the single request slot shared by every task; it holds
//! the sequence number of the owning invocation (0 while idle) and changes
//! only through compare-and-set. [`RequestMachine`] is owned by the task
//! running one invocation and turns its protocol events into
//! [`SessionEvent`]s.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::event::ProtocolEvent;
use crate::models::outcome::ExitOutcome;
use crate::models::session::{SessionEvent, SessionState};
use crate::protocol::status_label;

const IDLE: u64 = 0;

/// The single request slot.
#[derive(Debug, Default)]
pub struct SessionSlot {
    owner: AtomicU64,
}

impl SessionSlot {
    /// An idle slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `seq`; fails if any invocation owns it.
    pub fn try_acquire(&self, seq: u64) -> bool {
        debug_assert_ne!(seq, IDLE, "sequence numbers start at 1");
        self.owner
            .compare_exchange(IDLE, seq, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the slot if `seq` still owns it.
    pub fn release(&self, seq: u64) -> bool {
        self.owner
            .compare_exchange(seq, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Sequence number of the owning invocation, if any.
    #[must_use]
    pub fn owner(&self) -> Option<u64> {
        match self.owner.load(Ordering::Acquire) {
            IDLE => None,
            seq => Some(seq),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.owner().is_some() {
            SessionState::Busy
        } else {
            SessionState::Idle
        }
    }
}

/// Publishing side of the session event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the presentation layer consumes.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event; a dropped receiver is not an error.
    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("session event receiver dropped");
        }
    }
}

/// Per-invocation state machine.
///
/// Dropping an unfinished machine reports the invocation as interrupted, so
/// a task torn down by the runtime still frees the slot and fires
/// `Finished`.
#[derive(Debug)]
pub struct RequestMachine {
    seq: u64,
    slot: Arc<SessionSlot>,
    sink: EventSink,
    status_visible: bool,
    released: bool,
    finished: bool,
}

impl RequestMachine {
    /// Machine for invocation `seq`, which must already own `slot`.
    #[must_use]
    pub fn new(seq: u64, slot: Arc<SessionSlot>, sink: EventSink) -> Self {
        Self {
            seq,
            slot,
            sink,
            status_visible: false,
            released: false,
            finished: false,
        }
    }

    /// Apply one classified line.
    pub fn on_event(&mut self, event: ProtocolEvent) {
        if self.released || self.finished {
            debug!(seq = self.seq, ?event, "line after session release dropped");
            return;
        }

        match event {
            ProtocolEvent::Progress { .. } => match status_label(&event) {
                Some(text) => {
                    self.status_visible = true;
                    self.sink.emit(SessionEvent::Status { text });
                }
                None => debug!(seq = self.seq, ?event, "progress without status label"),
            },
            ProtocolEvent::OutputStart => self.clear_status(),
            ProtocolEvent::Text { content } => {
                self.clear_status();
                self.sink.emit(SessionEvent::Message { text: content });
            }
            ProtocolEvent::OutputEnd => {
                self.clear_status();
                self.release();
            }
        }
    }

    /// Apply the process exit. Publishes the failure line, if any, then
    /// `Finished`, exactly once.
    pub fn on_exit(&mut self, outcome: ExitOutcome) {
        if self.finished {
            warn!(seq = self.seq, "duplicate exit for finished invocation ignored");
            return;
        }
        self.finished = true;

        // A failed exit is always reported, even after `OUTPUT;END`
        // already freed the session.
        self.clear_status();
        if let Some(text) = outcome.error_line() {
            self.sink.emit(SessionEvent::Message { text });
        }
        self.release();

        self.sink.emit(SessionEvent::Finished {
            seq: self.seq,
            outcome,
        });
    }

    fn clear_status(&mut self) {
        if self.status_visible {
            self.status_visible = false;
            self.sink.emit(SessionEvent::StatusCleared);
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.slot.release(self.seq) {
            self.sink.emit(SessionEvent::Busy { busy: false });
        } else {
            warn!(seq = self.seq, owner = ?self.slot.owner(), "session slot owned by another invocation");
        }
    }
}

impl Drop for RequestMachine {
    fn drop(&mut self) {
        if !self.finished {
            debug!(seq = self.seq, "request task dropped before exit; reporting interrupted");
            self.on_exit(ExitOutcome::interrupted());
        }
    }
}
