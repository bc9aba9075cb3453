// ============================================================================
// Rate Limit Configuration
// ============================================================================

use crate::constants::{
    DEFAULT_RATE_LIMIT_KEY_PREFIX, DEFAULT_RATE_LIMIT_MAX_SENDS, DEFAULT_RATE_LIMIT_WINDOW_SECS,
};

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Counter store; None disables admission limiting entirely
    pub redis_url: Option<String>,
    pub max_sends: u32,
    pub window_secs: u64,
    /// Counter key prefix: "ratelimit:send:{ip}"
    pub key_prefix: String,
}

impl RateLimitConfig {
    pub(crate) fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> Self {
        let redis_url = var("UPSTASH_REDIS_URL").filter(|u| !u.trim().is_empty());
        if redis_url.is_none() {
            tracing::warn!("UPSTASH_REDIS_URL not set. Rate limiting will be disabled.");
        }

        Self {
            redis_url,
            max_sends: var("RATE_LIMIT_MAX_SENDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_MAX_SENDS),
            window_secs: var("RATE_LIMIT_WINDOW_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            key_prefix: var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_RATE_LIMIT_KEY_PREFIX.to_string()),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            max_sends: DEFAULT_RATE_LIMIT_MAX_SENDS,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            key_prefix: DEFAULT_RATE_LIMIT_KEY_PREFIX.to_string(),
        }
    }
}
