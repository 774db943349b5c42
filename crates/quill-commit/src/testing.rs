//! Test doubles shared by the assembler and submission tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use quill_sanitize::{parse_submission, Sanitizer};
use quill_store::{InMemoryObjectStore, ObjectStoreClient, RefUpdate, StoreResult, TreeOverlay};
use quill_types::{Document, ObjectId};

use crate::assembler::CommitAssembler;
use crate::config::CommitPolicy;

pub fn fast_policy(max_attempts: u32) -> CommitPolicy {
    CommitPolicy {
        max_attempts,
        backoff_base_ms: 1,
        backoff_max_ms: 4,
        deadline_secs: 25,
    }
}

pub fn submission_body(id: &str) -> String {
    serde_json::json!({
        "fullName": "Ada Lovelace",
        "email": "ada@example.com",
        "summary": "Analyst",
        "skills": ["math"],
        "education": [{"institution": "Home"}],
        "experience": [{"company": "Engine Co"}],
        "metadata": {"id": id, "createdAt": "2024-05-01T12:00:00.000Z"}
    })
    .to_string()
}

pub fn document(id: &str) -> Document {
    let raw = parse_submission(submission_body(id).as_bytes()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Sanitizer::new("_data/resumes").sanitize_at(raw, now).unwrap()
}

/// Decorates the in-memory store with scripted misbehavior.
pub struct Scripted {
    inner: Arc<InMemoryObjectStore>,
    rival: Mutex<Option<Document>>,
    conflicts: AtomicU32,
    delay: Option<Duration>,
    calls: AtomicU32,
    update_calls: AtomicU32,
}

impl Scripted {
    pub fn new(inner: Arc<InMemoryObjectStore>) -> Self {
        Self {
            inner,
            rival: Mutex::new(None),
            conflicts: AtomicU32::new(0),
            delay: None,
            calls: AtomicU32::new(0),
            update_calls: AtomicU32::new(0),
        }
    }

    /// Commit `rival` straight to the inner store just before the first
    /// `update_ref`, so that update loses the race.
    pub fn racing(self, rival: Document) -> Self {
        *self.rival.lock().unwrap() = Some(rival);
        self
    }

    /// Answer the next `n` ref updates with a conflict.
    pub fn conflicting(self, n: u32) -> Self {
        self.conflicts.store(n, Ordering::SeqCst);
        self
    }

    /// Sleep before every primitive.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Primitive calls of any kind.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ObjectStoreClient for Scripted {
    async fn get_ref(&self, branch: &str) -> StoreResult<ObjectId> {
        self.enter().await;
        self.inner.get_ref(branch).await
    }

    async fn create_blob(&self, content: &[u8]) -> StoreResult<ObjectId> {
        self.enter().await;
        self.inner.create_blob(content).await
    }

    async fn get_tree(&self, commit: &ObjectId) -> StoreResult<ObjectId> {
        self.enter().await;
        self.inner.get_tree(commit).await
    }

    async fn create_tree(&self, base: &ObjectId, entries: &[TreeOverlay]) -> StoreResult<ObjectId> {
        self.enter().await;
        self.inner.create_tree(base, entries).await
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> StoreResult<ObjectId> {
        self.enter().await;
        self.inner.create_commit(message, tree, parent).await
    }

    async fn update_ref(
        &self,
        branch: &str,
        new: &ObjectId,
        expected_old: &ObjectId,
    ) -> StoreResult<RefUpdate> {
        self.enter().await;
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let rival = self.rival.lock().unwrap().take();
        if let Some(rival) = rival {
            CommitAssembler::new(self.inner.clone(), branch, fast_policy(1))
                .unwrap()
                .commit(&rival)
                .await
                .unwrap();
        }

        let forced = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Ok(RefUpdate::Conflict);
        }
        self.inner.update_ref(branch, new, expected_old).await
    }
}
