//! The loosely-typed submission body, exactly as a client sends it.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEducation {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExperience {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Form checkboxes arrive as `true`, `"on"`, `1`, ...
    pub current: Option<Value>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProject {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub version: Option<String>,
}

/// A submission before validation. Every field is optional; unknown fields
/// are dropped.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResume {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<RawEducation>>,
    pub experience: Option<Vec<RawExperience>>,
    pub projects: Option<Vec<RawProject>>,
    pub template: Option<String>,
    pub metadata: Option<RawMetadata>,
}

/// Decode a UTF-8 JSON submission body.
pub fn parse_submission(body: &[u8]) -> Result<RawResume, ValidationError> {
    serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))
}
