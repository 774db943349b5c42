//! # quill-commit
//!
//! Turns a sanitized [`quill_types::Document`] into exactly one accepted
//! commit on a shared branch, then triggers a site build.
//!
//! The [`CommitAssembler`] runs the optimistic get-ref-to-update-ref loop
//! over any [`quill_store::ObjectStoreClient`]; the ref's compare-and-swap is
//! the only concurrency control. [`SubmissionService`] wraps it with
//! sanitizing, the build notifier and edit tokens, and is what every entry
//! point calls.

pub mod assembler;
pub mod config;
pub mod error;
pub mod notify;
pub mod submission;
pub mod token;

#[cfg(test)]
mod testing;

pub use assembler::{commit_message, CommitAssembler, CommitReceipt};
pub use config::CommitPolicy;
pub use error::{BuildNotifyError, CommitError, CommitResult, SubmissionError, TokenError};
pub use notify::{BuildNotifier, NoopNotifier, RecordingNotifier};
pub use submission::{BuildStatus, SubmissionReceipt, SubmissionService};
pub use token::EditTokenIssuer;
