//! In-memory input files.

use std::path::Path;

use crate::error::{IngestError, Result};

/// Maximum input file size (500 MB).
pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// One uploaded file, fully loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reads a file from disk, refusing files over [`MAX_FILE_SIZE`].
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_with_limit(path, MAX_FILE_SIZE)
    }

    pub fn from_path_with_limit(path: &Path, max_size: u64) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IngestError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                IngestError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if metadata.len() > max_size {
            return Err(IngestError::FileTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max_size,
            });
        }

        let bytes = std::fs::read(path).map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Lowercase extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}
