//! Session batch storage.
//!
//! Batches are JSON documents addressed by [`BatchId`]. Every entry expires
//! after the store's time to live so abandoned sessions clean themselves up.

mod file;
mod memory;

use std::time::Duration;

use convert_model::{BatchId, SessionId, Stage, StoredBatch};

use crate::error::{CoreError, Result};

pub use file::FileBatchStore;
pub use memory::MemoryBatchStore;

/// Default time to live of a stored batch.
pub const DEFAULT_BATCH_TTL: Duration = Duration::from_secs(3600);

/// Key-value storage for row batches.
pub trait BatchStore: Send + Sync {
    /// Stores `bytes` under `id`, replacing any previous value and
    /// restarting its expiry.
    fn put_raw(&self, id: &BatchId, bytes: Vec<u8>) -> Result<()>;

    /// Bytes stored under `id`, `None` when missing or expired.
    fn get_raw(&self, id: &BatchId) -> Result<Option<Vec<u8>>>;

    /// Removes `id`; returns whether anything was stored.
    fn delete(&self, id: &BatchId) -> Result<bool>;

    /// Live batch ids of one session stage in ascending sequence order.
    fn list(&self, session_id: &SessionId, stage: Stage) -> Result<Vec<BatchId>>;

    fn put_batch(&self, id: &BatchId, batch: &StoredBatch) -> Result<()> {
        let bytes = serde_json::to_vec(batch).map_err(|source| CoreError::EncodeBatch {
            key: id.key(),
            source,
        })?;
        self.put_raw(id, bytes)
    }

    fn get_batch(&self, id: &BatchId) -> Result<Option<StoredBatch>> {
        let Some(bytes) = self.get_raw(id)? else {
            return Ok(None);
        };
        decode_batch(id, &bytes).map(Some)
    }

    /// Removes every batch of one session stage.
    fn delete_stage(&self, session_id: &SessionId, stage: Stage) -> Result<usize> {
        let mut removed = 0;
        for id in self.list(session_id, stage)? {
            if self.delete(&id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every batch of a session, across all stages.
    fn delete_session(&self, session_id: &SessionId) -> Result<usize> {
        let mut removed = 0;
        for stage in Stage::ALL {
            removed += self.delete_stage(session_id, stage)?;
        }
        Ok(removed)
    }
}

/// Decodes a stored batch; a bare JSON array of rows is accepted as a
/// batch starting at row 0.
pub fn decode_batch(id: &BatchId, bytes: &[u8]) -> Result<StoredBatch> {
    let corrupt = |error: serde_json::Error| CoreError::CorruptBatch {
        key: id.key(),
        reason: error.to_string(),
    };
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(corrupt)?;
    if value.is_array() {
        let rows = serde_json::from_value(value).map_err(corrupt)?;
        return Ok(StoredBatch::new(0, rows));
    }
    serde_json::from_value(value).map_err(corrupt)
}
