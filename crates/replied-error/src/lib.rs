use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type with comprehensive error handling
///
/// Covers every failure an HTTP handler can surface. Variants that carry a
/// `code` expose it verbatim as `error_code` so callers can assert on the
/// cause of a rejection, not just on the status.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Request Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    // ===== Policy Errors =====
    /// User-caused rejection with a stable reason code
    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    #[error("Rate limit exceeded: {0}")]
    TooManyRequests(String),

    // ===== Dependency Errors =====
    /// A collaborator (store, identity provider) failed; details stay server-side
    #[error("{message}")]
    Dependency { code: &'static str, message: String },

    /// Transient failure, caller may retry
    #[error("{message}")]
    Unavailable { code: &'static str, message: String },

    // ===== Internal Server Errors =====
    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Dependency { .. } | AppError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Validation error: {}", msg),
            AppError::Auth(msg) => format!("Authentication failed: {}", msg),
            AppError::NotFound(msg) => format!("Not found: {}", msg),
            AppError::Conflict(msg) => format!("Conflict: {}", msg),
            AppError::Forbidden { message, .. } => message.clone(),
            AppError::TooManyRequests(msg) => msg.clone(),
            AppError::Unavailable { message, .. } => message.clone(),
            AppError::Dependency { .. } | AppError::Unknown(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Forbidden { code, .. } => *code,
            AppError::TooManyRequests(_) => "RATE_LIMITED",
            AppError::Dependency { code, .. } => *code,
            AppError::Unavailable { code, .. } => *code,
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Authentication failed"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let error_code = self.error_code();

        let response_body = if status.is_server_error() {
            // For server errors, don't expose internal details to client
            json!({
                "error": "Internal server error",
                "error_code": error_code,
                "status": status.as_u16(),
            })
        } else {
            json!({
                "error": self.user_message(),
                "error_code": error_code,
                "status": status.as_u16(),
            })
        };

        (status, axum::Json(response_body)).into_response()
    }
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Auth(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn forbidden(code: &'static str, msg: impl Into<String>) -> Self {
        AppError::Forbidden {
            code,
            message: msg.into(),
        }
    }

    pub fn dependency(code: &'static str, msg: impl Into<String>) -> Self {
        AppError::Dependency {
            code,
            message: msg.into(),
        }
    }

    pub fn unavailable(code: &'static str, msg: impl Into<String>) -> Self {
        AppError::Unavailable {
            code,
            message: msg.into(),
        }
    }
}
