//! Bounded retries for transient remote faults.
//!
//! This is a transport concern: a ref conflict is never retried here, it
//! belongs to the commit loop above.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use quill_types::ObjectId;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{StoreResult, TransientFault};
use crate::traits::{ObjectStoreClient, Primitive, RefUpdate, TreeOverlay};

/// Exponential backoff with equal jitter.
///
/// Attempt `n` waits a random duration in `[c/2, c]` where
/// `c = min(max, base * 2^n)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Upper bound of the wait before retry `attempt` (0-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let cap = self.ceiling(attempt).as_millis() as u64;
        let half = cap / 2;
        Duration::from_millis(half + rand::thread_rng().gen_range(0..=cap - half))
    }
}

/// How often, and how patiently, to retry a transient fault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first try; `0` disables retrying.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Run `op` until it succeeds, fails permanently, or exhausts `policy`.
pub async fn retry_transient<T, E, F, Fut>(
    policy: &RetryPolicy,
    what: impl fmt::Display,
    mut op: F,
) -> Result<T, E>
where
    E: TransientFault + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let backoff = policy.backoff();
    let mut retry = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && retry < policy.max_retries => {
                let delay = backoff.delay(retry);
                tracing::warn!(
                    operation = %what,
                    retry = retry + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            result => return result,
        }
    }
}

/// Wraps a client so each primitive absorbs transient faults.
///
/// Every primitive is safe to repeat: creates are content-addressed, and a
/// replayed `update_ref` either finds the ref already moved to `new` or
/// reports a conflict.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: ObjectStoreClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<C: ObjectStoreClient> ObjectStoreClient for RetryingClient<C> {
    async fn get_ref(&self, branch: &str) -> StoreResult<ObjectId> {
        retry_transient(&self.policy, Primitive::GetRef, || self.inner.get_ref(branch)).await
    }

    async fn create_blob(&self, content: &[u8]) -> StoreResult<ObjectId> {
        retry_transient(&self.policy, Primitive::CreateBlob, || {
            self.inner.create_blob(content)
        })
        .await
    }

    async fn get_tree(&self, commit: &ObjectId) -> StoreResult<ObjectId> {
        retry_transient(&self.policy, Primitive::GetTree, || self.inner.get_tree(commit)).await
    }

    async fn create_tree(&self, base: &ObjectId, entries: &[TreeOverlay]) -> StoreResult<ObjectId> {
        retry_transient(&self.policy, Primitive::CreateTree, || {
            self.inner.create_tree(base, entries)
        })
        .await
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> StoreResult<ObjectId> {
        retry_transient(&self.policy, Primitive::CreateCommit, || {
            self.inner.create_commit(message, tree, parent)
        })
        .await
    }

    async fn update_ref(
        &self,
        branch: &str,
        new: &ObjectId,
        expected_old: &ObjectId,
    ) -> StoreResult<RefUpdate> {
        retry_transient(&self.policy, Primitive::UpdateRef, || {
            self.inner.update_ref(branch, new, expected_old)
        })
        .await
    }
}
