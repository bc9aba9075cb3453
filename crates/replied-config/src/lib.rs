// ============================================================================
// Replied Config - Centralized configuration management
// ============================================================================
//
// Loads every setting the server needs from environment variables (with an
// optional .env file). Required: ENCRYPTION_KEY, SUPABASE_URL,
// SUPABASE_SERVICE_ROLE_KEY. Everything else has a default; the rate-limit
// store and the delivery credential are optional and disable their feature
// when absent.
//
// ============================================================================

mod constants;
mod logging;
mod notification;
mod rate_limit;
mod security;
mod store;

pub use constants::MAX_CONTENT_SIZE;
pub use logging::LoggingConfig;
pub use notification::NotificationConfig;
pub use rate_limit::RateLimitConfig;
pub use security::{SealFailurePolicy, SecurityConfig};
pub use store::StoreConfig;

use anyhow::Result;
use constants::DEFAULT_PORT;

/// Main configuration structure
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,

    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub notification: NotificationConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        if dotenvy::dotenv().is_err() {
            tracing::debug!("No .env file found, using system environment variables");
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            port,
            bind_address: format!("[::]:{}", port),
            logging: LoggingConfig::from_lookup(&var),
            security: SecurityConfig::from_lookup(&var)?,
            rate_limit: RateLimitConfig::from_lookup(&var),
            notification: NotificationConfig::from_lookup(&var),
            store: StoreConfig::from_lookup(&var)?,
        })
    }
}
