//! Error types for format detection and row reading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while detecting or reading an input file.
///
/// Every variant is fatal for the file it names; row-level problems are
/// logged and skipped by the readers instead.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the size limit.
    #[error("file {path} is too large ({size} bytes, limit {max_size})")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    // === Format Errors ===
    /// Format id not in the format table.
    #[error("unknown format id '{id}'")]
    UnknownFormatId { id: String },

    /// Encoding label not recognized.
    #[error("unknown encoding '{name}'")]
    UnknownEncoding { name: String },

    /// No candidate encoding could decode the file.
    #[error("could not decode {file} with any of: {tried}")]
    UnsupportedEncoding { file: String, tried: String },

    /// File has no header row or no content at all.
    #[error("{file} is empty")]
    EmptyFile { file: String },

    // === Parse Errors ===
    #[error("failed to parse CSV {file}: {message}")]
    Csv { file: String, message: String },

    #[error("failed to parse JSON {file}: {message}")]
    Json { file: String, message: String },

    #[error("failed to parse XML {file}: {message}")]
    Xml { file: String, message: String },

    #[error("failed to read workbook {file}: {message}")]
    Excel { file: String, message: String },

    #[error("failed to read PDF form {file}: {message}")]
    Pdf { file: String, message: String },
}

impl IngestError {
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            IngestError::UnsupportedEncoding { .. } => Some(
                "Save the file as UTF-8 or Shift_JIS, or add its encoding to the fallback list.",
            ),
            IngestError::UnknownFormatId { .. } => Some(
                "Use one of CSV_C_SJIS, CSV_C_UTF-8, CSV_T_SJIS, CSV_T_UTF-8, JSON, XML, EXCEL, PDF.",
            ),
            IngestError::FileTooLarge { .. } => Some("Split the file into smaller uploads."),
            _ => None,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
