use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use quill_types::{ContentHasher, ObjectId};

use crate::error::{StoreError, StoreResult};
use crate::object::{CommitObject, EntryMode, Tree, TreeEntry};
use crate::traits::{ObjectStoreClient, Primitive, RefUpdate, TreeOverlay};

#[derive(Default)]
struct State {
    blobs: HashMap<ObjectId, Vec<u8>>,
    trees: HashMap<ObjectId, Tree>,
    commits: HashMap<ObjectId, CommitObject>,
    refs: HashMap<String, ObjectId>,
}

/// In-memory, content-addressed object store with git-like semantics.
///
/// Backs the `memory` storage mode and the test suites. Every primitive runs
/// under a single lock, so `update_ref` is an atomic compare-and-swap.
pub struct InMemoryObjectStore {
    state: RwLock<State>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// A store with `branch` pointing at an empty root commit.
    pub fn with_branch(branch: &str) -> Self {
        let store = Self::new();
        store.init_branch(branch);
        store
    }

    /// Point `branch` at a fresh root commit with an empty tree, unless it
    /// already exists. Returns the branch head.
    pub fn init_branch(&self, branch: &str) -> ObjectId {
        let mut state = self.state.write().expect("lock poisoned");
        if let Some(head) = state.refs.get(branch) {
            return head.clone();
        }
        let tree = Tree::default();
        let tree_id = tree.compute_id();
        state.trees.insert(tree_id.clone(), tree);
        let commit = CommitObject {
            tree: tree_id,
            parent: None,
            message: "Initial commit".into(),
        };
        let id = commit.compute_id();
        state.commits.insert(id.clone(), commit);
        state.refs.insert(branch.to_string(), id.clone());
        id
    }

    /// Current head of `branch`, if it exists.
    pub fn head(&self, branch: &str) -> Option<ObjectId> {
        self.state
            .read()
            .expect("lock poisoned")
            .refs
            .get(branch)
            .cloned()
    }

    pub fn commit_object(&self, id: &ObjectId) -> Option<CommitObject> {
        self.state
            .read()
            .expect("lock poisoned")
            .commits
            .get(id)
            .cloned()
    }

    /// `commit` followed by its ancestors, newest first.
    pub fn ancestors(&self, commit: &ObjectId) -> Vec<ObjectId> {
        let state = self.state.read().expect("lock poisoned");
        let mut chain = Vec::new();
        let mut cursor = Some(commit.clone());
        while let Some(id) = cursor {
            cursor = state.commits.get(&id).and_then(|c| c.parent.clone());
            chain.push(id);
        }
        chain
    }

    /// Contents of the blob at `path` in `commit`'s tree.
    pub fn read_path(&self, commit: &ObjectId, path: &str) -> Option<Vec<u8>> {
        let state = self.state.read().expect("lock poisoned");
        let mut tree_id = state.commits.get(commit)?.tree.clone();
        let components: Vec<&str> = path.split('/').collect();
        let (file, dirs) = components.split_last()?;
        for dir in dirs {
            let entry = state.trees.get(&tree_id)?.get(dir)?;
            if entry.mode != EntryMode::Tree {
                return None;
            }
            tree_id = entry.id.clone();
        }
        let entry = state.trees.get(&tree_id)?.get(file)?;
        match entry.mode {
            EntryMode::Blob => state.blobs.get(&entry.id).cloned(),
            EntryMode::Tree => None,
        }
    }

    /// Every blob path in `commit`'s tree, sorted.
    pub fn list_paths(&self, commit: &ObjectId) -> Vec<String> {
        let state = self.state.read().expect("lock poisoned");
        let mut paths = Vec::new();
        if let Some(c) = state.commits.get(commit) {
            collect_paths(&state, &c.tree, "", &mut paths);
        }
        paths.sort();
        paths
    }

    /// Number of blobs, trees and commits held.
    pub fn object_count(&self) -> usize {
        let state = self.state.read().expect("lock poisoned");
        state.blobs.len() + state.trees.len() + state.commits.len()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_paths(state: &State, tree: &ObjectId, prefix: &str, out: &mut Vec<String>) {
    let Some(tree) = state.trees.get(tree) else {
        return;
    };
    for entry in tree.entries() {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        match entry.mode {
            EntryMode::Blob => out.push(path),
            EntryMode::Tree => collect_paths(state, &entry.id, &path, out),
        }
    }
}

fn split_path(path: &str) -> StoreResult<Vec<&str>> {
    let components: Vec<&str> = path.split('/').collect();
    if path.is_empty()
        || components
            .iter()
            .any(|c| c.is_empty() || *c == "." || *c == "..")
    {
        return Err(StoreError::invalid(
            Primitive::CreateTree,
            format!("malformed path {path:?}"),
        ));
    }
    Ok(components)
}

/// Write `blob` at `components` below `base`, storing every rewritten tree
/// and returning the new root id. Untouched entries are carried over.
fn overlay(
    state: &mut State,
    base: Option<&ObjectId>,
    components: &[&str],
    blob: &ObjectId,
) -> StoreResult<ObjectId> {
    let mut tree = match base {
        Some(id) => state.trees.get(id).cloned().ok_or_else(|| {
            StoreError::invalid(Primitive::CreateTree, format!("unknown tree {id}"))
        })?,
        None => Tree::default(),
    };
    let Some((name, rest)) = components.split_first() else {
        return Err(StoreError::invalid(Primitive::CreateTree, "empty path"));
    };
    let existing = tree.get(name).cloned();

    let entry = if rest.is_empty() {
        if matches!(&existing, Some(e) if e.mode == EntryMode::Tree) {
            return Err(StoreError::invalid(
                Primitive::CreateTree,
                format!("{name} is a directory"),
            ));
        }
        TreeEntry {
            mode: EntryMode::Blob,
            name: name.to_string(),
            id: blob.clone(),
        }
    } else {
        let subtree = match &existing {
            Some(e) if e.mode == EntryMode::Tree => Some(e.id.clone()),
            Some(_) => {
                return Err(StoreError::invalid(
                    Primitive::CreateTree,
                    format!("{name} is a file"),
                ))
            }
            None => None,
        };
        TreeEntry {
            mode: EntryMode::Tree,
            name: name.to_string(),
            id: overlay(state, subtree.as_ref(), rest, blob)?,
        }
    };

    tree.upsert(entry);
    let id = tree.compute_id();
    state.trees.entry(id.clone()).or_insert(tree);
    Ok(id)
}

fn is_ancestor(state: &State, ancestor: &ObjectId, descendant: &ObjectId) -> bool {
    let mut seen = HashSet::new();
    let mut cursor = Some(descendant.clone());
    while let Some(id) = cursor {
        if &id == ancestor {
            return true;
        }
        if !seen.insert(id.clone()) {
            return false;
        }
        cursor = state.commits.get(&id).and_then(|c| c.parent.clone());
    }
    false
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStore {
    async fn get_ref(&self, branch: &str) -> StoreResult<ObjectId> {
        self.head(branch)
            .ok_or_else(|| StoreError::invalid(Primitive::GetRef, format!("no such ref {branch}")))
    }

    async fn create_blob(&self, content: &[u8]) -> StoreResult<ObjectId> {
        let id = ContentHasher::BLOB.hash(content);
        let mut state = self.state.write().expect("lock poisoned");
        state
            .blobs
            .entry(id.clone())
            .or_insert_with(|| content.to_vec());
        Ok(id)
    }

    async fn get_tree(&self, commit: &ObjectId) -> StoreResult<ObjectId> {
        self.commit_object(commit)
            .map(|c| c.tree)
            .ok_or_else(|| StoreError::invalid(Primitive::GetTree, format!("unknown commit {commit}")))
    }

    async fn create_tree(&self, base: &ObjectId, entries: &[TreeOverlay]) -> StoreResult<ObjectId> {
        let mut state = self.state.write().expect("lock poisoned");
        if !state.trees.contains_key(base) {
            return Err(StoreError::invalid(
                Primitive::CreateTree,
                format!("unknown base tree {base}"),
            ));
        }
        let mut root = base.clone();
        for entry in entries {
            if !state.blobs.contains_key(&entry.blob) {
                return Err(StoreError::invalid(
                    Primitive::CreateTree,
                    format!("unknown blob {}", entry.blob),
                ));
            }
            let components = split_path(&entry.path)?;
            root = overlay(&mut state, Some(&root), &components, &entry.blob)?;
        }
        Ok(root)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> StoreResult<ObjectId> {
        let mut state = self.state.write().expect("lock poisoned");
        if !state.trees.contains_key(tree) {
            return Err(StoreError::invalid(
                Primitive::CreateCommit,
                format!("unknown tree {tree}"),
            ));
        }
        if !state.commits.contains_key(parent) {
            return Err(StoreError::invalid(
                Primitive::CreateCommit,
                format!("unknown parent {parent}"),
            ));
        }
        let commit = CommitObject {
            tree: tree.clone(),
            parent: Some(parent.clone()),
            message: message.to_string(),
        };
        let id = commit.compute_id();
        state.commits.entry(id.clone()).or_insert(commit);
        Ok(id)
    }

    async fn update_ref(
        &self,
        branch: &str,
        new: &ObjectId,
        expected_old: &ObjectId,
    ) -> StoreResult<RefUpdate> {
        let mut state = self.state.write().expect("lock poisoned");
        let Some(current) = state.refs.get(branch).cloned() else {
            return Err(StoreError::invalid(
                Primitive::UpdateRef,
                format!("no such ref {branch}"),
            ));
        };
        if &current == new {
            return Ok(RefUpdate::Updated);
        }
        if &current != expected_old {
            return Ok(RefUpdate::Conflict);
        }
        if !state.commits.contains_key(new) {
            return Err(StoreError::invalid(
                Primitive::UpdateRef,
                format!("unknown commit {new}"),
            ));
        }
        if !is_ancestor(&state, &current, new) {
            return Err(StoreError::invalid(
                Primitive::UpdateRef,
                "update is not a fast forward",
            ));
        }
        state.refs.insert(branch.to_string(), new.clone());
        Ok(RefUpdate::Updated)
    }
}
