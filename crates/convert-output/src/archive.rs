//! ZIP bundling of output buffers.

use std::io::{Cursor, Write};

use chrono::NaiveDate;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::{OutputError, Result};

/// One named file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Default entry name for a CSV produced on `date`.
pub fn archive_entry_name(date: NaiveDate) -> String {
    format!("{}_output.csv", date.format("%Y%m%d"))
}

/// Packs `entries` into one deflated ZIP archive, in the given order.
pub fn bundle(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in entries {
        zip.start_file(entry.name.as_str(), options)
            .map_err(|source| OutputError::Archive {
                entry: entry.name.clone(),
                source,
            })?;
        zip.write_all(&entry.bytes)?;
        tracing::debug!(entry = %entry.name, bytes = entry.bytes.len(), "added archive entry");
    }
    let cursor = zip.finish().map_err(|source| OutputError::Archive {
        entry: String::new(),
        source,
    })?;
    Ok(cursor.into_inner())
}
