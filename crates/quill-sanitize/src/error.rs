use thiserror::Error;

/// Why a submission was rejected. The display text is client-facing and is
/// returned verbatim by the HTTP endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required scalar field is absent or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The contact address does not look like an email address.
    #[error("Invalid email format")]
    InvalidEmail,

    /// A required collection has no usable entries.
    #[error("At least one {0} is required")]
    EmptyCollection(&'static str),

    /// A caller-supplied document id is not path-safe.
    #[error("Invalid document id: {0}")]
    InvalidId(String),

    /// The body is not JSON, or a field has the wrong JSON type.
    #[error("Malformed submission body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::InvalidEmail => "invalid_email",
            Self::EmptyCollection(_) => "empty_collection",
            Self::InvalidId(_) => "invalid_id",
            Self::MalformedBody(_) => "malformed_body",
        }
    }
}
