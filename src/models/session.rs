//! Session state and the notifications published to the presentation layer.

use serde::{Deserialize, Serialize};

use crate::models::outcome::ExitOutcome;

/// Two-state lifecycle of the single request slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No request in flight; submissions are accepted.
    Idle,
    /// A request owns the session; submissions are rejected.
    Busy,
}

/// Notification published by the session controller, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Input should be disabled (`true`) or re-enabled (`false`).
    Busy {
        /// New busy flag.
        busy: bool,
    },
    /// Show or replace the status indicator text.
    Status {
        /// Human-readable status line.
        text: String,
    },
    /// Hide the status indicator.
    StatusCleared,
    /// Append a message bubble.
    Message {
        /// Text to display verbatim.
        text: String,
    },
    /// The request finished; fired exactly once per invocation.
    Finished {
        /// Sequence number of the invocation that finished.
        seq: u64,
        /// How the worker run ended.
        outcome: ExitOutcome,
    },
}
