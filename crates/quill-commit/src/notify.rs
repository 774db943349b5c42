//! Build triggers fired after a submission is committed.

use std::sync::Mutex;

use async_trait::async_trait;
use quill_types::DocumentId;

use crate::error::BuildNotifyError;

/// Tells the site build pipeline that a document changed.
///
/// Called once per accepted commit, never on an abandoned attempt. Delivery
/// is at-least-once, so a build may run more than once per document.
#[async_trait]
pub trait BuildNotifier: Send + Sync {
    async fn notify(&self, id: &DocumentId) -> Result<(), BuildNotifyError>;
}

/// Discards every notification.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl BuildNotifier for NoopNotifier {
    async fn notify(&self, id: &DocumentId) -> Result<(), BuildNotifyError> {
        tracing::debug!(document = %id, "build trigger disabled");
        Ok(())
    }
}

/// Remembers every notified id in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notified: Mutex<Vec<DocumentId>>,
    failure: Option<BuildNotifyError>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls but answers each with `error`.
    pub fn failing(error: BuildNotifyError) -> Self {
        Self {
            notified: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn notified(&self) -> Vec<DocumentId> {
        self.notified.lock().expect("lock poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.notified.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl BuildNotifier for RecordingNotifier {
    async fn notify(&self, id: &DocumentId) -> Result<(), BuildNotifyError> {
        self.notified
            .lock()
            .expect("lock poisoned")
            .push(id.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
