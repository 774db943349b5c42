use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_EVENT_TYPE: &str = "resume-updated";
pub const API_VERSION: &str = "2022-11-28";

/// Where and as whom to talk to GitHub.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Never written back out.
    #[serde(skip_serializing)]
    pub token: String,
    pub user_agent: String,
    /// `repository_dispatch` event type the site workflow listens for.
    pub event_type: String,
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            owner: String::new(),
            repo: String::new(),
            token: String::new(),
            user_agent: concat!("quill/", env!("CARGO_PKG_VERSION")).into(),
            event_type: DEFAULT_EVENT_TYPE.into(),
            request_timeout_secs: 10,
        }
    }
}

impl GitHubConfig {
    /// Names of required settings that are still empty.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.owner.trim().is_empty() {
            missing.push("owner");
        }
        if self.repo.trim().is_empty() {
            missing.push("repo");
        }
        if self.token.trim().is_empty() {
            missing.push("token");
        }
        missing
    }

    /// `{api_base}/repos/{owner}/{repo}`.
    pub fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("user_agent", &self.user_agent)
            .field("event_type", &self.event_type)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
