//! File system batch store.
//!
//! Layout: `{root}/{hex(session)}/{stage}/{sequence}.json`. The first line
//! of every file is the RFC 3339 expiry, the rest is the batch JSON.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use convert_model::{BatchId, SessionId, Stage};

use super::{BatchStore, DEFAULT_BATCH_TTL};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone)]
pub struct FileBatchStore {
    root: PathBuf,
    ttl: Duration,
}

impl FileBatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_ttl(root, DEFAULT_BATCH_TTL)
    }

    pub fn with_ttl(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stage_dir(&self, session_id: &SessionId, stage: Stage) -> PathBuf {
        self.root
            .join(hex::encode(session_id.as_str()))
            .join(stage.batch_name())
    }

    fn batch_path(&self, id: &BatchId) -> PathBuf {
        self.stage_dir(&id.session_id, id.stage)
            .join(format!("{}.json", id.sequence))
    }

    fn expiry(&self) -> String {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        expires_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Removes `path` when its expiry line is in the past.
    fn remove_if_expired(&self, id: &BatchId, path: &Path, expiry_line: &str) -> Result<bool> {
        let expires_at = DateTime::parse_from_rfc3339(expiry_line.trim()).map_err(|error| {
            CoreError::CorruptBatch {
                key: id.key(),
                reason: format!("bad expiry line: {error}"),
            }
        })?;
        if expires_at > Utc::now() {
            return Ok(false);
        }
        tracing::debug!(key = %id, path = %path.display(), "removing expired batch");
        remove_file(path)?;
        Ok(true)
    }
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> CoreError {
    let path = path.to_path_buf();
    move |source| CoreError::StoreIo {
        operation,
        path,
        source,
    }
}

fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
        Err(error) => Err(io_error("remove", path)(error)),
    }
}

impl BatchStore for FileBatchStore {
    fn put_raw(&self, id: &BatchId, bytes: Vec<u8>) -> Result<()> {
        let path = self.batch_path(id);
        let dir = self.stage_dir(&id.session_id, id.stage);
        fs::create_dir_all(&dir).map_err(io_error("create directory", &dir))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(io_error("create", &temp_path))?;
        file.write_all(self.expiry().as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .and_then(|()| file.write_all(&bytes))
            .map_err(io_error("write", &temp_path))?;
        file.sync_all().map_err(io_error("sync", &temp_path))?;

        fs::rename(&temp_path, &path).map_err(|source| CoreError::AtomicWriteFailed {
            temp_path: temp_path.clone(),
            target_path: path.clone(),
            source,
        })?;
        tracing::trace!(key = %id, path = %path.display(), "stored batch");
        Ok(())
    }

    fn get_raw(&self, id: &BatchId) -> Result<Option<Vec<u8>>> {
        let path = self.batch_path(id);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(io_error("read", &path)(error)),
        };
        let split = contents.iter().position(|byte| *byte == b'\n').unwrap_or(contents.len());
        let expiry_line = String::from_utf8_lossy(&contents[..split]);
        if self.remove_if_expired(id, &path, &expiry_line)? {
            return Ok(None);
        }
        Ok(Some(contents.get(split + 1..).unwrap_or_default().to_vec()))
    }

    fn delete(&self, id: &BatchId) -> Result<bool> {
        remove_file(&self.batch_path(id))
    }

    fn list(&self, session_id: &SessionId, stage: Stage) -> Result<Vec<BatchId>> {
        let dir = self.stage_dir(session_id, stage);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(io_error("list", &dir)(error)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_error("list", &dir))?.path();
            if path.extension().is_none_or(|extension| extension != "json") {
                continue;
            }
            let Some(sequence) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
            else {
                tracing::debug!(path = %path.display(), "ignoring non-batch file");
                continue;
            };
            let id = BatchId::new(session_id.clone(), stage, sequence);

            let file = File::open(&path).map_err(io_error("open", &path))?;
            let mut expiry_line = String::new();
            BufReader::new(file)
                .read_line(&mut expiry_line)
                .map_err(io_error("read", &path))?;
            match self.remove_if_expired(&id, &path, &expiry_line) {
                Ok(true) => {}
                // A bad expiry line is listed so the reader reports it.
                Ok(false) | Err(_) => ids.push(id),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
