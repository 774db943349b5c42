use async_trait::async_trait;
use quill_commit::{BuildNotifier, BuildNotifyError};
use quill_store::{retry_transient, RetryPolicy};
use quill_types::DocumentId;
use serde_json::json;

use crate::client::{error_message, http_client, is_transient_status};
use crate::config::GitHubConfig;
use crate::error::GitHubError;

/// Triggers the site workflow through a `repository_dispatch` event.
pub struct GitHubDispatchNotifier {
    http: reqwest::Client,
    url: String,
    event_type: String,
    retry: RetryPolicy,
}

impl GitHubDispatchNotifier {
    pub fn new(config: &GitHubConfig, retry: RetryPolicy) -> Result<Self, GitHubError> {
        Ok(Self {
            http: http_client(config)?,
            url: format!("{}/dispatches", config.repo_url()),
            event_type: config.event_type.clone(),
            retry,
        })
    }

    async fn dispatch(&self, id: &DocumentId) -> Result<(), BuildNotifyError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&json!({
                "event_type": self.event_type,
                "client_payload": { "resumeId": id.as_str() },
            }))
            .send()
            .await
            .map_err(|e| BuildNotifyError::Transient(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = error_message(resp).await;
        let reason = format!("{status}: {message}");
        if is_transient_status(status, &message) {
            Err(BuildNotifyError::Transient(reason))
        } else {
            Err(BuildNotifyError::Rejected(reason))
        }
    }
}

#[async_trait]
impl BuildNotifier for GitHubDispatchNotifier {
    async fn notify(&self, id: &DocumentId) -> Result<(), BuildNotifyError> {
        retry_transient(&self.retry, "repository_dispatch", || self.dispatch(id)).await?;
        tracing::info!(document = %id, event = %self.event_type, "build triggered");
        Ok(())
    }
}
