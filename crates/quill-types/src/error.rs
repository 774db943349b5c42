use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid digest length: expected 40 or 64 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid document id {id:?}: {reason}")]
    InvalidDocumentId { id: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
