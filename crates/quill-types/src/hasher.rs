use crate::object::ObjectId;

/// BLAKE3 keyed by object kind.
///
/// The kind tag is mixed in ahead of the bytes, so a resume blob and a tree
/// whose serialized form happens to match still get distinct ids.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    pub const BLOB: Self = Self {
        domain: "quill-blob-v1",
    };
    pub const TREE: Self = Self {
        domain: "quill-tree-v1",
    };
    pub const COMMIT: Self = Self {
        domain: "quill-commit-v1",
    };

    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_digest(*hasher.finalize().as_bytes())
    }
}
