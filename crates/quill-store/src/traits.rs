//! The [`ObjectStoreClient`] capability.
//!
//! Any backend (the GitHub Git Data API, the in-memory store) implements this
//! trait. Callers compose commits from these primitives themselves; there is
//! no "write a file" shortcut.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use quill_types::ObjectId;

use crate::error::StoreResult;

/// The remote primitives, for logging and error attribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    GetRef,
    CreateBlob,
    GetTree,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GetRef => "get_ref",
            Self::CreateBlob => "create_blob",
            Self::GetTree => "get_tree",
            Self::CreateTree => "create_tree",
            Self::CreateCommit => "create_commit",
            Self::UpdateRef => "update_ref",
        })
    }
}

/// One path to overlay onto a base tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeOverlay {
    /// Slash-separated path relative to the tree root.
    pub path: String,
    /// Blob to place at `path`.
    pub blob: ObjectId,
}

impl TreeOverlay {
    pub fn new(path: impl Into<String>, blob: ObjectId) -> Self {
        Self {
            path: path.into(),
            blob,
        }
    }
}

/// Outcome of a compare-and-swap ref update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefUpdate {
    /// The ref now points at the new commit.
    Updated,
    /// The ref no longer held the expected value; nothing changed.
    Conflict,
}

impl RefUpdate {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Content-addressed object store with a single compare-and-swap ref
/// primitive.
///
/// Backend contract:
///
/// - `create_blob` is idempotent: identical bytes always yield the same id.
/// - `create_tree` overlays only the given paths on `base`; every other path
///   of `base` (siblings at any depth) is inherited unchanged. Intermediate
///   directories are created as needed.
/// - `update_ref` never forces: it moves the ref only if it still equals
///   `expected_old` and `new` descends from it, and reports
///   [`RefUpdate::Conflict`] otherwise.
/// - Transient faults surface as [`crate::StoreError::Transient`]; backends
///   do not retry themselves (see [`crate::RetryingClient`]).
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Current commit of `branch`.
    async fn get_ref(&self, branch: &str) -> StoreResult<ObjectId>;

    /// Store `content` and return its blob id.
    async fn create_blob(&self, content: &[u8]) -> StoreResult<ObjectId>;

    /// Root tree of `commit`.
    async fn get_tree(&self, commit: &ObjectId) -> StoreResult<ObjectId>;

    /// New tree equal to `base` with `entries` overlaid.
    async fn create_tree(&self, base: &ObjectId, entries: &[TreeOverlay]) -> StoreResult<ObjectId>;

    /// New commit with exactly one parent.
    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> StoreResult<ObjectId>;

    /// Move `branch` from `expected_old` to `new`.
    ///
    /// Precondition: `new` must be a commit whose single parent is
    /// `expected_old`. Backends without a native compare-and-swap (GitHub)
    /// enforce the swap through the fast-forward check, which only rejects
    /// a moved ref when `new` does not descend from the current head. A
    /// `new` built on some older ancestor could still fast-forward past a
    /// rival commit there.
    async fn update_ref(
        &self,
        branch: &str,
        new: &ObjectId,
        expected_old: &ObjectId,
    ) -> StoreResult<RefUpdate>;
}

#[async_trait]
impl<T: ObjectStoreClient + ?Sized> ObjectStoreClient for Arc<T> {
    async fn get_ref(&self, branch: &str) -> StoreResult<ObjectId> {
        (**self).get_ref(branch).await
    }

    async fn create_blob(&self, content: &[u8]) -> StoreResult<ObjectId> {
        (**self).create_blob(content).await
    }

    async fn get_tree(&self, commit: &ObjectId) -> StoreResult<ObjectId> {
        (**self).get_tree(commit).await
    }

    async fn create_tree(&self, base: &ObjectId, entries: &[TreeOverlay]) -> StoreResult<ObjectId> {
        (**self).create_tree(base, entries).await
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> StoreResult<ObjectId> {
        (**self).create_commit(message, tree, parent).await
    }

    async fn update_ref(
        &self,
        branch: &str,
        new: &ObjectId,
        expected_old: &ObjectId,
    ) -> StoreResult<RefUpdate> {
        (**self).update_ref(branch, new, expected_old).await
    }
}
