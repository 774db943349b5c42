use std::time::Duration;

use quill_sanitize::ValidationError;
use quill_store::{StoreError, TransientFault};
use quill_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("invalid commit policy: {0}")]
    InvalidPolicy(String),

    #[error("failed to serialize document: {0}")]
    Serialization(#[from] TypeError),

    #[error("remote store error: {0}")]
    Remote(#[from] StoreError),

    #[error("{branch} kept moving: gave up after {attempts} attempts")]
    ConcurrencyExhausted { attempts: u32, branch: String },

    #[error("commit did not complete within {deadline:?}")]
    Timeout { deadline: Duration },
}

pub type CommitResult<T> = Result<T, CommitError>;

/// Failure to trigger a site build. Never fatal to a submission.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildNotifyError {
    #[error("build trigger failed transiently: {0}")]
    Transient(String),

    #[error("build trigger rejected: {0}")]
    Rejected(String),

    #[error("build trigger did not answer in time")]
    TimedOut,
}

impl TransientFault for BuildNotifyError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("edit token key must be 32 bytes of hex: {0}")]
    InvalidKey(String),
}

/// Outcome kinds of a submission, kept distinct for callers.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The submission itself is unacceptable. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The branch moved on every attempt. Safe to resubmit.
    #[error("too much concurrent activity: gave up after {attempts} attempts")]
    ConcurrencyExhausted { attempts: u32 },

    /// The commit phase outran its deadline. Safe to resubmit.
    #[error("submission timed out after {deadline:?}")]
    Timeout { deadline: Duration },

    /// Any other failure to commit.
    #[error("could not store submission: {0}")]
    Remote(CommitError),
}

impl From<CommitError> for SubmissionError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::ConcurrencyExhausted { attempts, .. } => {
                Self::ConcurrencyExhausted { attempts }
            }
            CommitError::Timeout { deadline } => Self::Timeout { deadline },
            other => Self::Remote(other),
        }
    }
}

impl SubmissionError {
    /// Whether resubmitting the same document later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConcurrencyExhausted { .. } | Self::Timeout { .. } => true,
            Self::Remote(CommitError::Remote(e)) => e.is_transient(),
            _ => false,
        }
    }
}
