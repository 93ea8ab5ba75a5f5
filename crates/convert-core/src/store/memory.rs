//! In-process batch store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use convert_model::{BatchId, SessionId, Stage};

use super::{BatchStore, DEFAULT_BATCH_TTL};
use crate::error::Result;

#[derive(Debug)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// Batches kept in a map with per-entry expiry.
#[derive(Debug)]
pub struct MemoryBatchStore {
    ttl: Duration,
    entries: Mutex<BTreeMap<BatchId, Entry>>,
}

impl Default for MemoryBatchStore {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_TTL)
    }
}

impl MemoryBatchStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<BatchId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BatchStore for MemoryBatchStore {
    fn put_raw(&self, id: &BatchId, bytes: Vec<u8>) -> Result<()> {
        let expires_at = Instant::now() + self.ttl;
        self.entries().insert(id.clone(), Entry { bytes, expires_at });
        Ok(())
    }

    fn get_raw(&self, id: &BatchId) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries();
        match entries.get(id) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.bytes.clone())),
            Some(_) => {
                entries.remove(id);
                tracing::debug!(key = %id, "batch expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: &BatchId) -> Result<bool> {
        Ok(self.entries().remove(id).is_some())
    }

    fn list(&self, session_id: &SessionId, stage: Stage) -> Result<Vec<BatchId>> {
        let now = Instant::now();
        let mut entries = self.entries();
        entries.retain(|_, entry| entry.expires_at > now);
        // BatchId orders by session, stage, then numeric sequence.
        Ok(entries
            .keys()
            .filter(|id| &id.session_id == session_id && id.stage == stage)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(stage: Stage, sequence: u64) -> BatchId {
        BatchId::new(SessionId::new("abc").unwrap(), stage, sequence)
    }

    #[test]
    fn test_list_is_numeric_order() {
        let store = MemoryBatchStore::default();
        for sequence in [10, 2, 1] {
            store.put_raw(&id(Stage::Input, sequence), b"[]".to_vec()).unwrap();
        }
        store.put_raw(&id(Stage::Display, 3), b"[]".to_vec()).unwrap();

        let session = SessionId::new("abc").unwrap();
        let sequences: Vec<_> = store
            .list(&session, Stage::Input)
            .unwrap()
            .into_iter()
            .map(|id| id.sequence)
            .collect();
        assert_eq!(sequences, [1, 2, 10]);
        assert_eq!(store.delete_session(&session).unwrap(), 4);
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_entries_disappear() {
        let store = MemoryBatchStore::new(Duration::ZERO);
        store.put_raw(&id(Stage::Input, 1), b"[]".to_vec()).unwrap();
        assert_eq!(store.get_raw(&id(Stage::Input, 1)).unwrap(), None);
        assert!(store.is_empty());
    }
}
