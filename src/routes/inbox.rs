// ============================================================================
// Inbox Routes
// ============================================================================
//
// Endpoints (all authenticated):
// - GET  /inbox                  - Pending messages, newest first
// - GET  /history                - Closed messages with their replies
// - POST /reply                  - Reply to a message
// - POST /report                 - Report a message
// - POST /messages/{id}/archive  - Archive a message
//
// ============================================================================

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use replied_error::AppError;
use replied_types::MessageStatus;

use crate::context::AppContext;
use crate::routes::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
    pub message_id: Uuid,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportBody {
    pub message_id: Uuid,
}

/// GET /inbox
pub async fn inbox(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let messages = app_context.inbox.list_pending(user.0).await?;
    Ok(Json(messages))
}

/// GET /history
pub async fn history(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_context.inbox.history(user.0).await?;
    Ok(Json(entries))
}

/// POST /reply
pub async fn reply(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Json(body): Json<ReplyBody>,
) -> Result<impl IntoResponse, AppError> {
    let reply_id = app_context
        .inbox
        .publish_reply(user.0, body.message_id, &body.content)
        .await?;

    Ok(Json(json!({ "status": "replied", "reply_id": reply_id })))
}

/// POST /report
pub async fn report(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Json(body): Json<ReportBody>,
) -> Result<impl IntoResponse, AppError> {
    app_context
        .inbox
        .set_status(user.0, body.message_id, MessageStatus::Reported)
        .await?;

    Ok(Json(json!({ "status": "reported" })))
}

/// POST /messages/{id}/archive
pub async fn archive(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_context
        .inbox
        .set_status(user.0, message_id, MessageStatus::Archived)
        .await?;

    Ok(Json(json!({ "status": "archived" })))
}
