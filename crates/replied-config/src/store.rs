// ============================================================================
// Record Store / Identity Provider Configuration
// ============================================================================

use std::fmt;

use crate::constants::DEFAULT_HTTP_TIMEOUT_SECS;

/// Supabase project: PostgREST for records, GoTrue for identity
#[derive(Clone)]
pub struct StoreConfig {
    pub supabase_url: String,
    pub service_role_key: String,
    pub http_timeout_secs: u64,
}

impl StoreConfig {
    pub(crate) fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let supabase_url = var("SUPABASE_URL").filter(|v| !v.trim().is_empty());
        let service_role_key = var("SUPABASE_SERVICE_ROLE_KEY").filter(|v| !v.trim().is_empty());

        let (Some(supabase_url), Some(service_role_key)) = (supabase_url, service_role_key) else {
            anyhow::bail!("SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set");
        };

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            service_role_key,
            http_timeout_secs: var("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("supabase_url", &self.supabase_url)
            .field("service_role_key", &"[REDACTED]")
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}
