// ============================================================================
// Health and Metrics Routes
// ============================================================================
//
// Endpoints:
// - GET /health      - Liveness plus optional feature status
// - GET /health/live - Liveness only
// - GET /metrics     - Prometheus metrics
//
// ============================================================================

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use replied_error::AppError;

use crate::context::AppContext;

/// GET /health
pub async fn health_check(
    State(app_context): State<Arc<AppContext>>,
) -> Result<impl IntoResponse, AppError> {
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "rate_limiting": app_context.rate_limiting_enabled,
            "notifications": app_context.config.notification.enabled(),
        })),
    ))
}

/// GET /health/live
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics
/// Prometheus metrics endpoint
pub async fn metrics() -> Result<impl IntoResponse, AppError> {
    let metrics_data = replied_metrics::gather_metrics()?;
    Ok((
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        metrics_data,
    ))
}
