// ============================================================================
// Identity Provider
// ============================================================================
//
// Bearer tokens are verified by the external identity provider; this crate
// never parses or validates them itself.
//
// ============================================================================

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use replied_types::Principal;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("token rejected by identity provider")]
    Invalid,

    #[error("identity provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, IdentityError>;
}

/// Supabase GoTrue: `GET {url}/auth/v1/user` with the caller's token
#[derive(Clone)]
pub struct SupabaseIdentity {
    http_client: reqwest::Client,
    user_url: String,
    api_key: String,
}

impl SupabaseIdentity {
    pub fn new(http_client: reqwest::Client, supabase_url: &str, api_key: &str) -> Self {
        Self {
            http_client,
            user_url: format!("{}/auth/v1/user", supabase_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
        let response = self
            .http_client
            .get(&self.user_url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        match response.status() {
            s if s.is_success() => response
                .json::<Principal>()
                .await
                .map_err(|_| IdentityError::Invalid),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
                Err(IdentityError::Invalid)
            }
            s => Err(IdentityError::Transport(format!(
                "identity provider returned HTTP {}",
                s.as_u16()
            ))),
        }
    }
}
