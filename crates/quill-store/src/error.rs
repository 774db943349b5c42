use std::fmt;

use crate::traits::Primitive;

/// Errors from object-store primitives.
///
/// A ref conflict is deliberately absent: it is an expected outcome of
/// `update_ref`, reported as [`crate::RefUpdate::Conflict`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Network failure, timeout, 5xx or rate limiting. Safe to retry.
    #[error("{operation}: transient remote failure: {reason}")]
    Transient { operation: Primitive, reason: String },

    /// The remote rejected the request (4xx). Retrying cannot help.
    #[error("{operation}: invalid request: {reason}")]
    InvalidRequest { operation: Primitive, reason: String },

    /// The remote answered, but not with anything we can decode.
    #[error("{operation}: unexpected response: {reason}")]
    Protocol { operation: Primitive, reason: String },
}

impl StoreError {
    pub fn transient(operation: Primitive, reason: impl fmt::Display) -> Self {
        Self::Transient {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn invalid(operation: Primitive, reason: impl fmt::Display) -> Self {
        Self::InvalidRequest {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn protocol(operation: Primitive, reason: impl fmt::Display) -> Self {
        Self::Protocol {
            operation,
            reason: reason.to_string(),
        }
    }

    /// The primitive that failed.
    pub fn operation(&self) -> Primitive {
        match self {
            Self::Transient { operation, .. }
            | Self::InvalidRequest { operation, .. }
            | Self::Protocol { operation, .. } => *operation,
        }
    }
}

/// Classifies errors for [`crate::retry::retry_transient`].
pub trait TransientFault {
    fn is_transient(&self) -> bool;
}

impl TransientFault for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
