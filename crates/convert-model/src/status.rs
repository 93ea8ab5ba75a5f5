use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Success,
    Error,
}

/// Top-level outcome of a stage run, always `success` or `error`.
///
/// A successful run may still contain cells that fell back to their raw
/// value; those fallbacks are logged, not reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub status: RunState,
    pub message: String,
    #[serde(default)]
    pub batches_written: usize,
    #[serde(default)]
    pub batches_skipped: usize,
    #[serde(default)]
    pub rows: u64,
}

impl RunStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: RunState::Success,
            message: message.into(),
            batches_written: 0,
            batches_skipped: 0,
            rows: 0,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunState::Error,
            message: message.into(),
            batches_written: 0,
            batches_skipped: 0,
            rows: 0,
        }
    }

    pub fn with_counts(mut self, batches_written: usize, batches_skipped: usize, rows: u64) -> Self {
        self.batches_written = batches_written;
        self.batches_skipped = batches_skipped;
        self.rows = rows;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == RunState::Success
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.status {
            RunState::Success => "success",
            RunState::Error => "error",
        };
        write!(f, "{state}: {}", self.message)
    }
}
