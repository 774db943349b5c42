use std::sync::Arc;

use quill_commit::{
    BuildNotifier, CommitAssembler, EditTokenIssuer, NoopNotifier, SubmissionService,
};
use quill_github::{GitHubClient, GitHubDispatchNotifier};
use quill_sanitize::Sanitizer;
use quill_store::{InMemoryObjectStore, ObjectStoreClient, RetryingClient};

use crate::config::{QuillConfig, StorageBackend};
use crate::error::ServerResult;

/// Wire a [`SubmissionService`] for the configured backend.
pub fn build_service(config: &QuillConfig) -> ServerResult<SubmissionService> {
    config.validate()?;
    let branch = &config.storage.branch;

    let (client, notifier): (Arc<dyn ObjectStoreClient>, Arc<dyn BuildNotifier>) =
        match config.storage.backend {
            StorageBackend::Github => {
                let client = GitHubClient::new(&config.github)?;
                let notifier = GitHubDispatchNotifier::new(&config.github, config.transport.clone())?;
                tracing::info!(
                    owner = %config.github.owner,
                    repo = %config.github.repo,
                    branch = %branch,
                    "using github backend"
                );
                (
                    Arc::new(RetryingClient::new(client, config.transport.clone())),
                    Arc::new(notifier),
                )
            }
            StorageBackend::Memory => {
                tracing::warn!(branch = %branch, "using in-memory backend; submissions are not persisted");
                (
                    Arc::new(InMemoryObjectStore::with_branch(branch)),
                    Arc::new(NoopNotifier),
                )
            }
        };

    let tokens = match &config.token.key {
        Some(key) => EditTokenIssuer::from_hex(key)?,
        None => {
            tracing::warn!("no edit token key configured; tokens will not survive a restart");
            EditTokenIssuer::random()
        }
    };

    Ok(SubmissionService::new(
        Sanitizer::new(config.storage.data_root.clone()),
        CommitAssembler::new(client, branch.clone(), config.commit.clone())?,
        notifier,
        tokens,
    ))
}
