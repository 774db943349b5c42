//! # quill-github
//!
//! Quill's production backend: [`GitHubClient`] speaks the Git Data REST API
//! as an [`quill_store::ObjectStoreClient`], and [`GitHubDispatchNotifier`]
//! starts the site build with a `repository_dispatch` event.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;

pub use client::GitHubClient;
pub use config::{GitHubConfig, API_VERSION, DEFAULT_API_BASE, DEFAULT_EVENT_TYPE};
pub use dispatch::GitHubDispatchNotifier;
pub use error::GitHubError;
