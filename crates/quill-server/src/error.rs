use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("github error: {0}")]
    GitHub(#[from] quill_github::GitHubError),

    #[error("commit error: {0}")]
    Commit(#[from] quill_commit::CommitError),

    #[error("edit token error: {0}")]
    Token(#[from] quill_commit::TokenError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
