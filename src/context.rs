use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use replied_config::Config;
use replied_crypto::{Sealer, Vault};
use replied_redis::RedisClient;

use crate::content_guard::ContentGuard;
use crate::identity::{IdentityProvider, SupabaseIdentity};
use crate::inbox::InboxService;
use crate::notification::{NotificationDispatcher, Notifier};
use crate::rate_limit::{AdmissionLimiter, CounterStore, RedisCounterStore};
use crate::repository::MessageRepository;
use crate::store::{PostgrestStore, RecordStore};
use crate::submission::SubmissionOrchestrator;

/// Application context containing shared dependencies
///
/// Every collaborator is constructed once at start-up and injected here;
/// handlers reach them through `State<Arc<AppContext>>`.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub submissions: SubmissionOrchestrator,
    pub inbox: InboxService,
    pub identity: Arc<dyn IdentityProvider>,
    pub rate_limiting_enabled: bool,
}

impl AppContext {
    /// Wire the pipeline from already-constructed collaborators
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityProvider>,
        sealer: Arc<dyn Sealer>,
        notifier: Arc<dyn Notifier>,
        counters: Option<Arc<dyn CounterStore>>,
    ) -> Self {
        let salt = config.logging.hash_salt.as_str();
        let repository = MessageRepository::new(store);
        let limiter = AdmissionLimiter::new(counters, &config.rate_limit).with_log_salt(salt);
        let rate_limiting_enabled = limiter.is_enabled();

        let submissions = SubmissionOrchestrator::new(
            limiter,
            ContentGuard::default(),
            repository.clone(),
            identity.clone(),
            sealer.clone(),
            notifier,
            config.security.seal_failure_policy,
            Duration::from_secs(config.security.submission_timeout_secs),
        )
        .with_log_salt(salt);

        Self {
            inbox: InboxService::new(repository, sealer),
            submissions,
            identity,
            rate_limiting_enabled,
            config,
        }
    }

    /// Build production collaborators from configuration
    ///
    /// An unusable encryption key is fatal. An unreachable rate-limit store
    /// is not: admission limiting is disabled with a warning.
    pub async fn from_config(config: Arc<Config>) -> Result<Self> {
        let vault = Vault::from_hex(&config.security.encryption_key_hex)
            .context("Invalid ENCRYPTION_KEY")?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.store.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let counters: Option<Arc<dyn CounterStore>> = match &config.rate_limit.redis_url {
            Some(url) => match connect_counters(url).await {
                Ok(client) => {
                    tracing::info!("Connected to rate-limit store");
                    Some(Arc::new(RedisCounterStore::new(client)))
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to connect to rate-limit store, rate limiting disabled"
                    );
                    None
                }
            },
            None => None,
        };

        let store = Arc::new(PostgrestStore::new(
            http_client.clone(),
            &config.store.supabase_url,
            &config.store.service_role_key,
        ));
        let identity = Arc::new(SupabaseIdentity::new(
            http_client.clone(),
            &config.store.supabase_url,
            &config.store.service_role_key,
        ));
        let notifier = Arc::new(NotificationDispatcher::new(
            http_client,
            config.notification.clone(),
        ));

        Ok(Self::new(
            config,
            store,
            identity,
            Arc::new(vault),
            notifier,
            counters,
        ))
    }
}

async fn connect_counters(url: &str) -> replied_redis::Result<RedisClient> {
    let mut client = RedisClient::connect(url).await?;
    client.ping().await?;
    Ok(client)
}
