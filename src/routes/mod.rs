// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - health.rs: Health check and metrics endpoints
// - messages.rs: Public message submission
// - inbox.rs: Recipient inbox, history, reply, report, archive
// - extractors.rs: Custom Axum extractors (client IP, bearer, authenticated user)
//
// ============================================================================

mod extractors;
mod health;
mod inbox;
mod messages;

pub use extractors::{AuthenticatedUser, ClientIp, OptionalBearer};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        // Health and monitoring
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/metrics", get(health::metrics))
        // Public submission
        .route("/send", post(messages::send_message))
        // Recipient operations
        .route("/inbox", get(inbox::inbox))
        .route("/history", get(inbox::history))
        .route("/reply", post(inbox::reply))
        .route("/report", post(inbox::report))
        .route("/messages/{id}/archive", post(inbox::archive))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(app_context)
}
