//! Optimistic commit assembly against a moving branch.
//!
//! One attempt is the full sequence `get_ref → create_blob → get_tree →
//! create_tree → create_commit → update_ref`, with the new commit's single
//! parent equal to the head read at the start of the same attempt. A ref
//! conflict discards the whole attempt and starts again from `get_ref`, so a
//! stale tree or parent can never be published. Only one commit is accepted
//! per ref value, which rules out lost updates without any local lock.

use std::sync::Arc;

use quill_store::{ObjectStoreClient, RefUpdate, TreeOverlay};
use quill_types::{Document, DocumentId, ObjectId};
use tokio::time::Instant;

use crate::config::CommitPolicy;
use crate::error::{CommitError, CommitResult};

/// What a successful commit produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub commit: ObjectId,
    pub parent: ObjectId,
    pub tree: ObjectId,
    pub blob: ObjectId,
    /// 1 when the first attempt won the race.
    pub attempts: u32,
}

pub struct CommitAssembler {
    client: Arc<dyn ObjectStoreClient>,
    branch: String,
    policy: CommitPolicy,
}

impl CommitAssembler {
    pub fn new(
        client: Arc<dyn ObjectStoreClient>,
        branch: impl Into<String>,
        policy: CommitPolicy,
    ) -> CommitResult<Self> {
        policy.validate()?;
        Ok(Self {
            client,
            branch: branch.into(),
            policy,
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn policy(&self) -> &CommitPolicy {
        &self.policy
    }

    /// Commit `document` within the policy deadline.
    pub async fn commit(&self, document: &Document) -> CommitResult<CommitReceipt> {
        self.commit_until(document, Instant::now() + self.policy.deadline())
            .await
    }

    /// Commit `document`, abandoning in-flight calls at `deadline`.
    pub async fn commit_until(
        &self,
        document: &Document,
        deadline: Instant,
    ) -> CommitResult<CommitReceipt> {
        let budget = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout_at(deadline, self.run(document)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    document = %document.id,
                    branch = %self.branch,
                    "commit deadline elapsed"
                );
                Err(CommitError::Timeout { deadline: budget })
            }
        }
    }

    async fn run(&self, document: &Document) -> CommitResult<CommitReceipt> {
        let content = document.to_canonical_json()?;
        let message = commit_message(&document.id);
        let overlay_path = document.path.clone();
        let backoff = self.policy.backoff();

        for attempt in 1..=self.policy.max_attempts {
            let head = self.client.get_ref(&self.branch).await?;
            let blob = self.client.create_blob(&content).await?;
            let base = self.client.get_tree(&head).await?;
            let tree = self
                .client
                .create_tree(&base, &[TreeOverlay::new(overlay_path.clone(), blob.clone())])
                .await?;
            let commit = self.client.create_commit(&message, &tree, &head).await?;

            match self.client.update_ref(&self.branch, &commit, &head).await? {
                RefUpdate::Updated => {
                    tracing::info!(
                        document = %document.id,
                        attempt,
                        head = %head.short_hex(),
                        commit = %commit.short_hex(),
                        "commit accepted"
                    );
                    return Ok(CommitReceipt {
                        commit,
                        parent: head,
                        tree,
                        blob,
                        attempts: attempt,
                    });
                }
                RefUpdate::Conflict => {
                    tracing::warn!(
                        document = %document.id,
                        attempt,
                        head = %head.short_hex(),
                        commit = %commit.short_hex(),
                        "branch moved, retrying"
                    );
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(backoff.delay(attempt - 1)).await;
                    }
                }
            }
        }

        Err(CommitError::ConcurrencyExhausted {
            attempts: self.policy.max_attempts,
            branch: self.branch.clone(),
        })
    }
}

pub fn commit_message(id: &DocumentId) -> String {
    format!("Add resume {id}")
}
