use thiserror::Error;

/// Errors raised while building or parsing model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown stage '{name}'")]
    UnknownStage { name: String },

    #[error("invalid batch key '{key}': {reason}")]
    InvalidBatchKey { key: String, reason: String },

    #[error("duplicate header index {index} in stage layout ('{first}' and '{second}')")]
    DuplicateHeaderIndex {
        index: usize,
        first: String,
        second: String,
    },

    #[error("header '{name}' not found in stage layout")]
    HeaderNotFound { name: String },

    #[error("session id must not be empty")]
    EmptySessionId,
}

pub type Result<T> = std::result::Result<T, ModelError>;
