//! HTTP server for Quill.
//!
//! Accepts resume submissions over JSON, commits them through the configured
//! object store and reports the outcome with status codes a browser form can
//! act on.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use bootstrap::build_service;
pub use config::{QuillConfig, ServerSection, StorageBackend, StorageSection, TokenSection};
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, HealthResponse, SubmitResponse};
pub use server::QuillServer;
