//! Foundation types for Quill.
//!
//! Every other Quill crate depends on `quill-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`]: content-addressed id of a blob, tree, or commit
//! - [`DocumentId`]: path-safe id of a submitted document
//! - [`Resume`]: the canonical, sanitized record
//! - [`Document`]: a resume plus its storage path, ready to commit
//! - [`ContentHasher`]: domain-separated BLAKE3 hashing

pub mod document;
pub mod error;
pub mod hasher;
pub mod object;

pub use document::{
    document_path, Document, DocumentId, Education, Experience, Metadata, Project, Resume,
    Template, MAX_DOCUMENT_ID_LEN,
};
pub use error::TypeError;
pub use hasher::ContentHasher;
pub use object::ObjectId;
