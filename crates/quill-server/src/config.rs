use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use quill_commit::CommitPolicy;
use quill_github::GitHubConfig;
use quill_store::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Which object store submissions are committed to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Github,
    /// Process-local store; contents vanish on exit.
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: SocketAddr,
    /// Public site root used for `resumeUrl` and `editUrl`. Defaults to the
    /// GitHub Pages address of the configured repository.
    pub site_url: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8787)),
            site_url: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackend,
    pub branch: String,
    pub data_root: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            branch: "main".into(),
            data_root: "_data/resumes".into(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSection {
    /// 32-byte hex key for edit tokens. Random per process when unset.
    #[serde(skip_serializing)]
    pub key: Option<String>,
}

impl std::fmt::Debug for TokenSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSection")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything a Quill process needs, as read from `quill.toml`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub github: GitHubConfig,
    pub commit: CommitPolicy,
    pub transport: RetryPolicy,
    pub token: TokenSection,
}

impl QuillConfig {
    /// Load from `path` (or defaults), apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// As [`Self::load`], reading overrides through `env`.
    pub fn load_with(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = env(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        };
        set(&mut self.github.token, "GITHUB_TOKEN");
        set(&mut self.github.owner, "GITHUB_OWNER");
        set(&mut self.github.repo, "GITHUB_REPO");
        set(&mut self.storage.branch, "GITHUB_BRANCH");
        if let Some(key) = env("QUILL_EDIT_TOKEN_KEY").filter(|v| !v.trim().is_empty()) {
            self.token.key = Some(key);
        }
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.storage.branch.trim().is_empty() {
            return Err(ServerError::Config("storage.branch is empty".into()));
        }
        self.commit.validate()?;
        if self.storage.backend == StorageBackend::Github {
            let missing = self.github.missing();
            if !missing.is_empty() {
                return Err(ServerError::Config(format!(
                    "the github backend needs github.{} (or GITHUB_{})",
                    missing.join(", github."),
                    missing
                        .iter()
                        .map(|m| m.to_ascii_uppercase())
                        .collect::<Vec<_>>()
                        .join(", GITHUB_")
                )));
            }
        }
        Ok(())
    }

    /// Public site root without a trailing slash, if one is known.
    pub fn site_url(&self) -> Option<String> {
        match &self.server.site_url {
            Some(url) => Some(url.trim_end_matches('/').to_string()),
            None if self.storage.backend == StorageBackend::Github => Some(format!(
                "https://{}.github.io/{}",
                self.github.owner, self.github.repo
            )),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let c = QuillConfig::default();
        assert_eq!(c.server.bind_addr, "127.0.0.1:8787".parse::<SocketAddr>().unwrap());
        assert_eq!(c.storage.backend, StorageBackend::Github);
        assert_eq!(c.storage.branch, "main");
        assert_eq!(c.storage.data_root, "_data/resumes");
        assert_eq!(c.github.event_type, "resume-updated");
        assert_eq!(c.commit.max_attempts, 5);
        assert_eq!(c.transport.max_retries, 3);
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "0.0.0.0:9000"
site_url = "https://resumes.example.com/"

[storage]
backend = "memory"
data_root = "data/people"

[commit]
max_attempts = 7
"#
        )
        .unwrap();

        let c = QuillConfig::load_with(Some(file.path()), env(&[])).unwrap();
        assert_eq!(c.server.bind_addr.port(), 9000);
        assert_eq!(c.storage.backend, StorageBackend::Memory);
        assert_eq!(c.storage.data_root, "data/people");
        assert_eq!(c.storage.branch, "main");
        assert_eq!(c.commit.max_attempts, 7);
        assert_eq!(c.commit.deadline_secs, 25);
        assert_eq!(c.site_url().as_deref(), Some("https://resumes.example.com"));
    }

    #[test]
    fn env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[github]\nowner = \"file-owner\"\nrepo = \"site\"").unwrap();

        let c = QuillConfig::load_with(
            Some(file.path()),
            env(&[
                ("GITHUB_TOKEN", "ghp_x"),
                ("GITHUB_OWNER", "acme"),
                ("GITHUB_BRANCH", "gh-pages"),
            ]),
        )
        .unwrap();
        assert_eq!(c.github.owner, "acme");
        assert_eq!(c.github.repo, "site");
        assert_eq!(c.github.token, "ghp_x");
        assert_eq!(c.storage.branch, "gh-pages");
        assert_eq!(c.site_url().as_deref(), Some("https://acme.github.io/site"));
    }

    #[test]
    fn github_backend_requires_credentials() {
        let err = QuillConfig::load_with(None, env(&[("GITHUB_OWNER", "acme")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("github.repo"), "{msg}");
        assert!(msg.contains("GITHUB_TOKEN"), "{msg}");
    }

    #[test]
    fn memory_backend_needs_no_credentials() {
        let c = QuillConfig::from_toml("[storage]\nbackend = \"memory\"").unwrap();
        c.validate().unwrap();
        assert_eq!(c.site_url(), None);
    }

    #[test]
    fn rejects_zero_attempts() {
        let c =
            QuillConfig::from_toml("[storage]\nbackend = \"memory\"\n[commit]\nmax_attempts = 0")
                .unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = QuillConfig::from_toml("[storage]\nbackend = \"s3\"").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = QuillConfig::load_with(Some(Path::new("/nonexistent/quill.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
    }

    #[test]
    fn edit_token_key_from_env() {
        let mut c = QuillConfig::default();
        c.apply_env(env(&[("QUILL_EDIT_TOKEN_KEY", "ab")]));
        assert_eq!(c.token.key.as_deref(), Some("ab"));
        assert!(!format!("{:?}", c.token).contains("ab"));
    }
}
