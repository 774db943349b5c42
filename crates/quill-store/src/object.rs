//! Tree and commit objects as the in-memory backend stores them.

use quill_types::{ContentHasher, ObjectId};
use serde::Serialize;

/// Kind of a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMode {
    /// Normal file (0o100644).
    Blob,
    /// Subtree (0o040000).
    Tree,
}

impl EntryMode {
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Blob => 0o100644,
            Self::Tree => 0o040000,
        }
    }
}

/// A single named entry of a tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub id: ObjectId,
}

/// A directory listing, entries kept sorted by name so identical contents
/// always hash to the same id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Insert or replace the entry called `entry.name`.
    pub fn upsert(&mut self, entry: TreeEntry) {
        match self
            .entries
            .binary_search_by(|e| e.name.as_str().cmp(&entry.name))
        {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::TREE.hash(&canonical_bytes(self))
    }
}

/// An immutable snapshot: a root tree plus its history link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitObject {
    pub tree: ObjectId,
    /// `None` only for the root commit of a branch.
    pub parent: Option<ObjectId>,
    pub message: String,
}

impl CommitObject {
    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::COMMIT.hash(&canonical_bytes(self))
    }
}

fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    // Plain structs of strings and enums always serialize.
    serde_json::to_vec(value).unwrap_or_default()
}
