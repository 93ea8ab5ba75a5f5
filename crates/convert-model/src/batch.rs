use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::SessionId;
use crate::stage::Stage;

/// Typed identifier of one persisted batch.
///
/// Ordering is by session, then stage, then numeric sequence, so a sorted
/// list of ids is already in processing order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId {
    pub session_id: SessionId,
    pub stage: Stage,
    pub sequence: u64,
}

impl BatchId {
    pub fn new(session_id: SessionId, stage: Stage, sequence: u64) -> Self {
        Self {
            session_id,
            stage,
            sequence,
        }
    }

    /// Same session and sequence in another stage.
    pub fn with_stage(&self, stage: Stage) -> Self {
        Self {
            session_id: self.session_id.clone(),
            stage,
            sequence: self.sequence,
        }
    }

    /// Key in the external store format `{session}-{stage}:{sequence}`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parses a key in the `{session}-{stage}:{sequence}` format.
    pub fn parse_key(key: &str) -> Result<Self> {
        let invalid = |reason: &str| ModelError::InvalidBatchKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let (prefix, sequence) = key
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing ':' before sequence number"))?;
        let sequence = sequence
            .parse::<u64>()
            .map_err(|_| invalid("sequence is not a number"))?;
        let (session, stage) = prefix
            .rsplit_once('-')
            .ok_or_else(|| invalid("missing '-' before stage name"))?;
        let stage = Stage::from_batch_name(stage).ok_or_else(|| invalid("unknown stage name"))?;
        let session_id = SessionId::new(session).map_err(|_| invalid("empty session id"))?;
        Ok(Self::new(session_id, stage, sequence))
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}:{}",
            self.session_id,
            self.stage.batch_name(),
            self.sequence
        )
    }
}
