//! Canonical resume records and the [`Document`] that wraps one for storage.
//!
//! A [`Resume`] is only ever constructed by the sanitizer; everything
//! downstream of it (commit assembly, notification) assumes its text fields
//! are already escaped and its URLs already allowlisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;

/// Maximum length of a document id.
pub const MAX_DOCUMENT_ID_LEN: usize = 64;

/// Path-safe identifier of a submitted document.
///
/// Ids are 1..=64 characters of `[A-Za-z0-9_-]`, so `{data_root}/{id}.json`
/// is always a single well-formed path component below the data root.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and wrap an existing id.
    pub fn parse(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty".to_string())
        } else if id.len() > MAX_DOCUMENT_ID_LEN {
            Some(format!("longer than {MAX_DOCUMENT_ID_LEN} characters"))
        } else if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            Some(format!("contains disallowed character {c:?}"))
        } else {
            None
        };
        match reason {
            Some(reason) => Err(TypeError::InvalidDocumentId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// Generate a fresh collision-resistant id.
    ///
    /// UUID v7 in simple form: a 48-bit millisecond timestamp prefix followed
    /// by random bits, so ids sort roughly by submission time.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Rendering template choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Default,
    Modern,
}

impl Template {
    /// Every supported template.
    pub const ALL: [Template; 2] = [Template::Default, Template::Modern];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Modern => "modern",
        }
    }

    /// Resolve a requested name; unknown names are `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub technologies: Vec<String>,
}

/// Submission bookkeeping stored alongside the resume content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub id: DocumentId,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub version: String,
}

/// A sanitized resume record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: String,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub projects: Vec<Project>,
    pub template: Template,
    pub metadata: Metadata,
}

/// A resume ready to be committed: its id, content, and storage path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub content: Resume,
    pub path: String,
}

impl Document {
    /// Wrap a resume, deriving the storage path `{data_root}/{id}.json`.
    pub fn new(content: Resume, data_root: &str) -> Self {
        let id = content.metadata.id.clone();
        let path = document_path(data_root, &id);
        Self { id, content, path }
    }

    /// Deterministic wire encoding: UTF-8 JSON, 2-space indent, keys sorted
    /// at every depth. Identical content always yields identical bytes.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, TypeError> {
        let value = serde_json::to_value(&self.content)
            .map_err(|e| TypeError::Serialization(e.to_string()))?;
        serde_json::to_vec_pretty(&sort_keys(value))
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

/// Storage path for a document id below `data_root`.
pub fn document_path(data_root: &str, id: &DocumentId) -> String {
    let root = data_root.trim_matches('/');
    if root.is_empty() {
        format!("{id}.json")
    } else {
        format!("{root}/{id}.json")
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
