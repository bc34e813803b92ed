//! A single user request and its identity.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// One user request, owned by the task that runs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Invocation {
    /// Monotonic sequence number; never zero.
    pub seq: u64,
    /// Correlation identifier used in logs.
    pub id: String,
    /// Raw input text passed to the worker.
    pub input: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Invocation {
    /// Construct a new invocation with the next sequence number.
    #[must_use]
    pub fn new(input: String) -> Self {
        Self {
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
            id: Uuid::new_v4().to_string(),
            input,
            created_at: Utc::now(),
        }
    }
}
