use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use quill_types::{
    Document, DocumentId, Education, Experience, Metadata, Project, Resume, Template,
};
use regex::Regex;

use crate::error::ValidationError;
use crate::raw::{RawEducation, RawExperience, RawMetadata, RawProject, RawResume};
use crate::text::{escape_opt, escape_text, sanitize_url, truthy};

/// Schema version stamped into metadata the client did not supply.
pub const RECORD_VERSION: &str = "1.0.0";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));

/// Turns raw submissions into canonical [`Document`]s stored below
/// `data_root`.
#[derive(Clone, Debug)]
pub struct Sanitizer {
    data_root: String,
}

impl Sanitizer {
    pub fn new(data_root: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &str {
        &self.data_root
    }

    /// Validate and normalize a submission, stamping the current time on
    /// records without a creation timestamp.
    pub fn sanitize(&self, raw: RawResume) -> Result<Document, ValidationError> {
        self.sanitize_at(raw, Utc::now())
    }

    /// As [`Self::sanitize`], with an explicit clock.
    pub fn sanitize_at(
        &self,
        raw: RawResume,
        now: DateTime<Utc>,
    ) -> Result<Document, ValidationError> {
        let resume = sanitize_resume(raw, now)?;
        Ok(Document::new(resume, &self.data_root))
    }
}

/// The pure validation and normalization rules.
///
/// Checks run in a fixed order so the same bad input always reports the
/// same error: required scalars and skills, email shape, education, then
/// experience.
pub fn sanitize_resume(raw: RawResume, now: DateTime<Utc>) -> Result<Resume, ValidationError> {
    let full_name = required(raw.full_name.as_deref(), "fullName")?;
    let email = required(raw.email.as_deref(), "email")?;
    let summary = required(raw.summary.as_deref(), "summary")?;
    let skills: Vec<String> = raw
        .skills
        .unwrap_or_default()
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| escape_text(s))
        .collect();
    if skills.is_empty() {
        return Err(ValidationError::MissingField("skills"));
    }

    if !EMAIL.is_match(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }

    let education = non_empty(raw.education, "education entry")?;
    let experience = non_empty(raw.experience, "experience entry")?;

    Ok(Resume {
        full_name: escape_text(full_name),
        email: escape_text(email.trim()),
        phone: escape_opt(raw.phone.as_deref()),
        location: escape_opt(raw.location.as_deref()),
        summary: escape_text(summary),
        website: sanitize_url(raw.website.as_deref()),
        linkedin: sanitize_url(raw.linkedin.as_deref()),
        github: sanitize_url(raw.github.as_deref()),
        skills,
        education: education.into_iter().map(education_entry).collect(),
        experience: experience.into_iter().map(experience_entry).collect(),
        projects: raw
            .projects
            .unwrap_or_default()
            .into_iter()
            .map(project_entry)
            .collect(),
        template: raw
            .template
            .as_deref()
            .and_then(Template::from_name)
            .unwrap_or_default(),
        metadata: metadata(raw.metadata.unwrap_or_default(), now)?,
    })
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::MissingField(field))
}

fn non_empty<T>(items: Option<Vec<T>>, what: &'static str) -> Result<Vec<T>, ValidationError> {
    match items {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ValidationError::EmptyCollection(what)),
    }
}

fn education_entry(raw: RawEducation) -> Education {
    Education {
        institution: escape_opt(raw.institution.as_deref()),
        degree: escape_opt(raw.degree.as_deref()),
        start_date: escape_opt(raw.start_date.as_deref()),
        end_date: escape_opt(raw.end_date.as_deref()),
        description: escape_opt(raw.description.as_deref()),
    }
}

fn experience_entry(raw: RawExperience) -> Experience {
    Experience {
        company: escape_opt(raw.company.as_deref()),
        position: escape_opt(raw.position.as_deref()),
        start_date: escape_opt(raw.start_date.as_deref()),
        end_date: escape_opt(raw.end_date.as_deref()),
        current: truthy(raw.current.as_ref()),
        description: escape_opt(raw.description.as_deref()),
    }
}

fn project_entry(raw: RawProject) -> Project {
    Project {
        title: escape_opt(raw.title.as_deref()),
        url: sanitize_url(raw.url.as_deref()),
        description: escape_opt(raw.description.as_deref()),
        technologies: raw
            .technologies
            .unwrap_or_default()
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| escape_text(t))
            .collect(),
    }
}

fn metadata(raw: RawMetadata, now: DateTime<Utc>) -> Result<Metadata, ValidationError> {
    let id = match raw.id.filter(|id| !id.is_empty()) {
        Some(id) => DocumentId::parse(id).map_err(|e| ValidationError::InvalidId(e.to_string()))?,
        None => DocumentId::generate(),
    };
    Ok(Metadata {
        id,
        created_at: raw
            .created_at
            .map(|ts| escape_text(&ts))
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        version: raw
            .version
            .map(|v| escape_text(&v))
            .unwrap_or_else(|| RECORD_VERSION.to_string()),
    })
}
