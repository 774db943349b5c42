//! # quill-store
//!
//! The object-store capability Quill commits through: content-addressed
//! blobs, trees that overlay paths onto a base, single-parent commits, and a
//! compare-and-swap ref update.
//!
//! - [`ObjectStoreClient`]: the capability trait every backend implements.
//! - [`InMemoryObjectStore`]: a git-like backend held in memory.
//! - [`RetryingClient`]: absorbs transient faults with bounded, jittered
//!   backoff.

pub mod error;
pub mod memory;
pub mod object;
pub mod retry;
pub mod traits;

pub use error::{StoreError, StoreResult, TransientFault};
pub use memory::InMemoryObjectStore;
pub use object::{CommitObject, EntryMode, Tree, TreeEntry};
pub use retry::{retry_transient, Backoff, RetryPolicy, RetryingClient};
pub use traits::{ObjectStoreClient, Primitive, RefUpdate, TreeOverlay};
