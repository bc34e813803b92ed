//! Typed events produced from worker output lines.

use serde::{Deserialize, Serialize};

/// Subsystem that emitted a progress marker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProgressDomain {
    /// Package-manager operations.
    #[serde(rename = "JPM")]
    Jpm,
    /// Language-model generation.
    #[serde(rename = "GPT")]
    Gpt,
}

impl ProgressDomain {
    /// Parse the wire tag; tags are case-sensitive.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "JPM" => Some(Self::Jpm),
            "GPT" => Some(Self::Gpt),
            _ => None,
        }
    }
}

/// `label:value` payload naming the item a progress marker acts on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Detail {
    /// Label before the first colon, e.g. `pkg`.
    pub label: String,
    /// Everything after the first colon.
    pub value: String,
}

impl Detail {
    /// Construct a detail payload.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One classified worker output line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// In-flight status of a long-running operation.
    Progress {
        /// Emitting subsystem.
        domain: ProgressDomain,
        /// Raw operation name, e.g. `install`.
        operation: String,
        /// Optional item the operation acts on.
        detail: Option<Detail>,
    },
    /// The substantive answer begins.
    OutputStart,
    /// The substantive answer is complete.
    OutputEnd,
    /// A plain line to surface verbatim.
    Text {
        /// The whole line as received.
        content: String,
    },
}
