use std::sync::Arc;

use quill_sanitize::{parse_submission, RawResume, Sanitizer};
use quill_types::{DocumentId, ObjectId};
use tokio::time::Instant;

use crate::assembler::CommitAssembler;
use crate::error::{BuildNotifyError, SubmissionError};
use crate::notify::BuildNotifier;
use crate::token::EditTokenIssuer;

/// Whether the site build was triggered for an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    Triggered,
    /// The document is stored, but the site will not show it until the
    /// next build.
    Degraded { reason: String },
}

impl BuildStatus {
    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub document_id: DocumentId,
    pub path: String,
    pub commit: ObjectId,
    pub attempts: u32,
    pub build: BuildStatus,
    pub edit_token: String,
}

/// The end-to-end pipeline: sanitize, commit, notify, issue an edit token.
///
/// Sanitizing happens before any remote call, so a rejected submission
/// leaves no trace in the store. The policy deadline covers the commit;
/// notification gets whatever budget is left, and running out of it only
/// degrades the reported build status.
pub struct SubmissionService {
    sanitizer: Sanitizer,
    assembler: CommitAssembler,
    notifier: Arc<dyn BuildNotifier>,
    tokens: EditTokenIssuer,
}

impl SubmissionService {
    pub fn new(
        sanitizer: Sanitizer,
        assembler: CommitAssembler,
        notifier: Arc<dyn BuildNotifier>,
        tokens: EditTokenIssuer,
    ) -> Self {
        Self {
            sanitizer,
            assembler,
            notifier,
            tokens,
        }
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn assembler(&self) -> &CommitAssembler {
        &self.assembler
    }

    pub fn tokens(&self) -> &EditTokenIssuer {
        &self.tokens
    }

    /// Decode a JSON body and submit it.
    pub async fn submit_bytes(&self, body: &[u8]) -> Result<SubmissionReceipt, SubmissionError> {
        let raw = parse_submission(body)?;
        self.submit(raw).await
    }

    pub async fn submit(&self, raw: RawResume) -> Result<SubmissionReceipt, SubmissionError> {
        let deadline = Instant::now() + self.assembler.policy().deadline();
        let document = self.sanitizer.sanitize(raw)?;
        tracing::debug!(document = %document.id, path = %document.path, "submission sanitized");

        let receipt = self.assembler.commit_until(&document, deadline).await?;

        let build = match tokio::time::timeout_at(deadline, self.notifier.notify(&document.id)).await
        {
            Ok(Ok(())) => BuildStatus::Triggered,
            Ok(Err(err)) => degraded(&document.id, err),
            Err(_) => degraded(&document.id, BuildNotifyError::TimedOut),
        };

        Ok(SubmissionReceipt {
            edit_token: self.tokens.issue(&document.id),
            document_id: document.id,
            path: document.path,
            commit: receipt.commit,
            attempts: receipt.attempts,
            build,
        })
    }
}

fn degraded(id: &DocumentId, err: BuildNotifyError) -> BuildStatus {
    tracing::warn!(document = %id, error = %err, "stored, but build trigger failed");
    BuildStatus::Degraded {
        reason: err.to_string(),
    }
}
