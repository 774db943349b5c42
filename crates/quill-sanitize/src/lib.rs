//! Document sanitizer for Quill.
//!
//! [`Sanitizer::sanitize`] is a pure function from a raw submission to a
//! canonical [`quill_types::Document`]. It performs no I/O: a rejected
//! submission never reaches the object store.
//!
//! Rules:
//!
//! - full name, email, summary, at least one skill, one education entry and
//!   one experience entry are required
//! - free text is HTML-escaped
//! - URL fields keep only `http`/`https` values
//! - the template falls back to `default`
//! - a missing id is generated (time-ordered prefix, random suffix)

pub mod error;
pub mod raw;
pub mod sanitizer;
pub mod text;

pub use error::ValidationError;
pub use raw::{parse_submission, RawEducation, RawExperience, RawMetadata, RawProject, RawResume};
pub use sanitizer::{sanitize_resume, Sanitizer, RECORD_VERSION};
pub use text::{escape_text, sanitize_url};
