//! Error types for storage, orchestration and profiles.

use std::path::PathBuf;

use convert_ingest::IngestError;
use convert_map::MapError;
use convert_model::{ModelError, Stage};
use convert_output::OutputError;
use convert_rules::RuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // === Batch Store Errors ===
    #[error("failed to {operation} batch file {path}: {source}")]
    StoreIo {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file could not be renamed over the batch file.
    #[error("failed to replace batch file {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored batch could not be decoded.
    #[error("batch {key} is corrupt: {reason}")]
    CorruptBatch { key: String, reason: String },

    #[error("failed to encode batch {key}: {source}")]
    EncodeBatch {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // === Configuration Errors ===
    #[error("failed to read profile {path}: {source}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile {path}: {source}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid profile: {message}")]
    InvalidProfile { message: String },

    #[error("failed to build worker pool: {message}")]
    WorkerPool { message: String },

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    // === Run Errors ===
    #[error("failed to read {file}: {source}")]
    Ingest {
        file: String,
        #[source]
        source: IngestError,
    },

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("no data found for {} stage", .stage.display_name())]
    NoData { stage: Stage },

    #[error("none of the {total} {} batches could be read", .stage.display_name())]
    NoReadableBatches { stage: Stage, total: usize },

    #[error("none of the uploaded files could be read: {}", .failures.join("; "))]
    NoReadableFiles { failures: Vec<String> },

    /// A stage run finished with an `error` status.
    #[error("{} run failed: {message}", .stage.display_name())]
    RunFailed { stage: Stage, message: String },

    // === Session Errors ===
    #[error("row {row_index} not found in {} stage", .stage.display_name())]
    RowNotFound { row_index: u64, stage: Stage },

    #[error("header '{header}' not found in {} stage", .stage.display_name())]
    HeaderNotFound { header: String, stage: Stage },
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Per-batch and per-row problems; the rest of the session goes on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::CorruptBatch { .. } | CoreError::Ingest { .. } | CoreError::Rule(_)
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::ProfileRead { .. }
                | CoreError::ProfileParse { .. }
                | CoreError::InvalidProfile { .. }
                | CoreError::Map(_)
                | CoreError::Model(_)
        )
    }

    /// Short message without file paths or cell values, for end users.
    pub fn user_message(&self) -> &str {
        match self {
            Self::StoreIo { .. } | Self::AtomicWriteFailed { .. } | Self::EncodeBatch { .. } => {
                "Could not save the converted rows."
            }
            Self::CorruptBatch { .. } | Self::NoReadableBatches { .. } => {
                "Stored rows could not be read. Please upload the files again."
            }
            Self::ProfileRead { .. } | Self::ProfileParse { .. } | Self::InvalidProfile { .. } => {
                "The conversion profile is invalid."
            }
            Self::Map(_) | Self::Model(_) | Self::Rule(_) => {
                "The rule settings for this conversion are invalid."
            }
            Self::Ingest { .. } | Self::NoReadableFiles { .. } => {
                "The uploaded file could not be read."
            }
            Self::NoData { .. } => "There is no data to convert.",
            Self::RowNotFound { .. } | Self::HeaderNotFound { .. } => {
                "The selected cell does not exist."
            }
            Self::WorkerPool { .. } | Self::Output(_) | Self::RunFailed { .. } => {
                "The conversion failed."
            }
        }
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CoreError::Map(error) => Some(error.suggestion()),
            CoreError::Ingest { source, .. } => source.suggestion(),
            CoreError::ProfileParse { .. } => Some("Check the profile against the documented TOML layout"),
            CoreError::NoData { .. } => Some("Ingest files into the session before running later stages"),
            CoreError::HeaderNotFound { .. } => Some("Use a header name from the stage layout"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let corrupt = CoreError::CorruptBatch {
            key: "s-processed:1".to_string(),
            reason: "expected value".to_string(),
        };
        assert!(corrupt.is_recoverable());
        assert!(!corrupt.is_configuration());

        let config = CoreError::Map(MapError::EmptyRuleSet);
        assert!(config.is_configuration());
        assert!(!config.is_recoverable());
        assert_eq!(
            CoreError::NoData { stage: Stage::Display }.to_string(),
            "no data found for display stage"
        );
        assert_eq!(config.user_message(), "The rule settings for this conversion are invalid.");
    }
}
