// ============================================================================
// Logging Configuration
// ============================================================================

use crate::constants::{DEFAULT_LOG_HASH_SALT, DEFAULT_RUST_LOG};

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// tracing-subscriber EnvFilter directive
    pub rust_log: String,
    /// Salt for log_safe_id; IPs and user ids are never logged in clear
    pub hash_salt: String,
}

impl LoggingConfig {
    pub(crate) fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> Self {
        let hash_salt = var("LOG_HASH_SALT").unwrap_or_else(|| DEFAULT_LOG_HASH_SALT.to_string());
        if hash_salt == DEFAULT_LOG_HASH_SALT {
            tracing::warn!("LOG_HASH_SALT not set, using the built-in salt for log-safe ids");
        }

        Self {
            rust_log: var("RUST_LOG").unwrap_or_else(|| DEFAULT_RUST_LOG.to_string()),
            hash_salt,
        }
    }
}
