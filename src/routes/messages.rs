// ============================================================================
// Messages Routes
// ============================================================================
//
// Endpoints:
// - POST /send - Submit a message to a recipient's inbox (public)
//
// ============================================================================

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use replied_error::AppError;

use crate::context::AppContext;
use crate::routes::extractors::{ClientIp, OptionalBearer};
use crate::submission::SubmissionRequest;

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// POST /send
/// Runs the submission pipeline; 201 on acceptance
///
/// An unreadable body still goes through the pipeline so it is counted
/// against the source before being refused.
pub async fn send_message(
    State(app_context): State<Arc<AppContext>>,
    ClientIp(client_ip): ClientIp,
    OptionalBearer(bearer_token): OptionalBearer,
    body: Result<Json<SendMessageBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = match body {
        Ok(Json(body)) => SubmissionRequest {
            receiver_id: body.receiver_id,
            content: body.content,
            thread_id: body.thread_id,
            source_key: client_ip,
            bearer_token,
            malformed: None,
        },
        Err(rejection) => SubmissionRequest {
            source_key: client_ip,
            bearer_token,
            malformed: Some(rejection.body_text()),
            ..Default::default()
        },
    };

    let accepted = app_context.submissions.submit(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "sent",
            "message_id": accepted.message_id,
        })),
    ))
}
