/// Admission Limiting
///
/// Fixed-window counters per source key (client IP by default):
/// - N admissions per window, the window starts on the first admission
/// - counter and expiry are set by one atomic store operation
/// - store unavailable or unconfigured: fail open, admit and warn
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use replied_config::RateLimitConfig;
use replied_redis::RedisClient;

use crate::utils::{log_safe_id, normalize_ip};

/// Atomic increment-with-first-write-expiry over a shared counter store
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment `key`, starting a `window` expiry when the key is created.
    /// Returns the count after the increment.
    async fn incr_with_expiry(&self, key: &str, window: Duration) -> Result<u64>;
}

/// Counter store backed by Redis
#[derive(Clone)]
pub struct RedisCounterStore {
    client: RedisClient,
}

impl RedisCounterStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_with_expiry(&self, key: &str, window: Duration) -> Result<u64> {
        // ConnectionManager clones share the multiplexed connection
        let mut client = self.client.clone();
        Ok(client.incr_with_expiry(key, window.as_secs().max(1)).await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

#[derive(Clone)]
pub struct AdmissionLimiter {
    store: Option<Arc<dyn CounterStore>>,
    max_admissions: u64,
    window: Duration,
    key_prefix: String,
    log_salt: String,
}

impl AdmissionLimiter {
    pub fn new(store: Option<Arc<dyn CounterStore>>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            max_admissions: u64::from(config.max_sends),
            window: Duration::from_secs(config.window_secs),
            key_prefix: config.key_prefix.clone(),
            log_salt: String::new(),
        }
    }

    /// Salt used when logging source keys
    pub fn with_log_salt(mut self, salt: &str) -> Self {
        self.log_salt = salt.to_string();
        self
    }

    /// A limiter with no store; everything is admitted
    pub fn disabled() -> Self {
        Self::new(None, &RateLimitConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn counter_key(&self, source_key: &str) -> String {
        format!("{}{}", self.key_prefix, normalize_ip(source_key))
    }

    pub async fn admit(&self, source_key: &str) -> Admission {
        let Some(store) = &self.store else {
            return Admission::Allowed;
        };

        let key = self.counter_key(source_key);
        match store.incr_with_expiry(&key, self.window).await {
            Ok(count) if count > self.max_admissions => {
                tracing::warn!(
                    source = %log_safe_id(source_key, &self.log_salt),
                    count = count,
                    limit = self.max_admissions,
                    "Admission denied, rate limit exceeded"
                );
                Admission::Denied
            }
            Ok(_) => Admission::Allowed,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source = %log_safe_id(source_key, &self.log_salt),
                    "Rate limit store unavailable, admitting request"
                );
                replied_metrics::RATE_LIMITER_FAIL_OPEN_TOTAL.inc();
                Admission::Allowed
            }
        }
    }
}
