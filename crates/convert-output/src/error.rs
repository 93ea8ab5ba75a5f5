//! Error types for output generation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// Format id names an input-only container.
    #[error("{format} cannot be written as an output format")]
    UnsupportedFormat { format: String },

    /// A row does not line up with the header list.
    #[error("row {row} has {actual} values but there are {expected} headers")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("failed to write CSV: {source}")]
    Csv {
        #[source]
        source: ::csv::Error,
    },

    #[error("failed to write workbook: {source}")]
    Excel {
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("failed to write JSON: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write XML: {message}")]
    Xml { message: String },

    #[error("failed to build archive entry {entry}: {source}")]
    Archive {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("output I/O failed: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OutputError>;

impl From<std::io::Error> for OutputError {
    fn from(source: std::io::Error) -> Self {
        OutputError::Io { source }
    }
}

impl From<rust_xlsxwriter::XlsxError> for OutputError {
    fn from(source: rust_xlsxwriter::XlsxError) -> Self {
        OutputError::Excel { source }
    }
}
