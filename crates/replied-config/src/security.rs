// ============================================================================
// Security Configuration
// ============================================================================

use std::fmt;

use crate::constants::DEFAULT_SUBMISSION_TIMEOUT_SECS;

/// What the submission pipeline does when sealing the content fails
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SealFailurePolicy {
    /// Log a warning and persist the plaintext (historical behaviour)
    #[default]
    StorePlaintext,
    /// Reject the submission
    Reject,
}

impl SealFailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "store_plaintext" | "plaintext" => Some(Self::StorePlaintext),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct SecurityConfig {
    /// AES-256 key, 64 hex characters
    pub encryption_key_hex: String,
    pub seal_failure_policy: SealFailurePolicy,
    /// Upper bound on one submission before persistence
    pub submission_timeout_secs: u64,
}

impl SecurityConfig {
    pub(crate) fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let encryption_key_hex = var("ENCRYPTION_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("ENCRYPTION_KEY must be set"))?;

        let seal_failure_policy = match var("SEAL_FAILURE_POLICY") {
            Some(raw) => SealFailurePolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    value = %raw,
                    "Unknown SEAL_FAILURE_POLICY, defaulting to 'store_plaintext'"
                );
                SealFailurePolicy::StorePlaintext
            }),
            None => SealFailurePolicy::default(),
        };

        Ok(Self {
            encryption_key_hex,
            seal_failure_policy,
            submission_timeout_secs: var("SUBMISSION_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_SUBMISSION_TIMEOUT_SECS),
        })
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_key_hex", &"[REDACTED]")
            .field("seal_failure_policy", &self.seal_failure_policy)
            .field("submission_timeout_secs", &self.submission_timeout_secs)
            .finish()
    }
}
