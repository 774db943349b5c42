use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("github is not configured: missing {0}")]
    MissingSettings(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
