use std::time::Duration;

use quill_store::Backoff;
use serde::{Deserialize, Serialize};

use crate::error::{CommitError, CommitResult};

/// Bounds on the optimistic commit loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitPolicy {
    /// Full get-ref-to-update-ref sequences before giving up.
    pub max_attempts: u32,
    /// Backoff between conflicting attempts.
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Wall-clock budget for one submission.
    pub deadline_secs: u64,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base_ms: 100,
            backoff_max_ms: 2_000,
            deadline_secs: 25,
        }
    }
}

impl CommitPolicy {
    pub fn validate(&self) -> CommitResult<()> {
        if self.max_attempts == 0 {
            return Err(CommitError::InvalidPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.deadline_secs == 0 {
            return Err(CommitError::InvalidPolicy(
                "deadline_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_max_ms),
        )
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = CommitPolicy::default();
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.deadline(), Duration::from_secs(25));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_zero_attempts() {
        let p = CommitPolicy {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(CommitError::InvalidPolicy(_))));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let p: CommitPolicy = toml::from_str("max_attempts = 8").unwrap();
        assert_eq!(p.max_attempts, 8);
        assert_eq!(p.backoff_base_ms, 100);
        assert_eq!(p.deadline_secs, 25);
    }
}
