// ============================================================================
// Axum Extractors
// ============================================================================
//
// - ClientIp: admission source key (X-Forwarded-For, X-Real-IP, socket)
// - OptionalBearer: raw bearer token if present, never rejects
// - AuthenticatedUser: bearer token verified by the identity provider
//
// ============================================================================

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use replied_error::AppError;

use crate::context::AppContext;
use crate::identity::IdentityError;
use crate::utils::{extract_client_ip, log_safe_id};

#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientIp(extract_client_ip(&parts.headers, direct_ip)))
    }
}

#[derive(Debug, Clone)]
pub struct OptionalBearer(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalBearer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalBearer(bearer_token(&parts.headers).map(str::to_string)))
    }
}

/// Extractor for the caller's user id
///
/// Usage:
/// ```rust,ignore
/// async fn handler(user: AuthenticatedUser, ...) -> Result<...> {
///     let user_id = user.0;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequestParts<Arc<AppContext>> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTHORIZATION) {
            None => return Err(AppError::auth("Missing Authorization header")),
            Some(_) => bearer_token(&parts.headers)
                .ok_or_else(|| AppError::auth("Invalid Authorization header format"))?,
        };

        match state.identity.verify(token).await {
            Ok(principal) => {
                tracing::debug!(
                    user = %log_safe_id(&principal.user_id.to_string(), &state.config.logging.hash_salt),
                    "Request authenticated"
                );
                Ok(AuthenticatedUser(principal.user_id))
            }
            Err(IdentityError::Invalid) => Err(AppError::auth("Invalid or expired token")),
            Err(e) => Err(AppError::dependency("IDENTITY_UNAVAILABLE", e.to_string())),
        }
    }
}

/// Token from `Authorization: Bearer <token>`, if well-formed and non-empty
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
