// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Best-effort, at-most-once email notification of a new message. Runs
// detached from the request: no join handle is kept, no error travels back
// to the submitter, nothing is retried. A missing delivery credential turns
// every call into a silent skip.
//
// Payload (Resend-compatible):
//   POST {endpoint}
//   Authorization: Bearer {api_key}
//   {"from": ..., "to": [contact], "subject": ..., "html": ...}
//
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use replied_config::NotificationConfig;
use replied_metrics::NOTIFICATIONS_TOTAL;

use crate::utils::escape_html;

/// What to tell whom. `contact` is the opened (plaintext) address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub contact: String,
    pub display_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// No delivery credential configured
    Skipped,
    /// Endpoint answered with a non-2xx status
    Rejected(u16),
    TransportError,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Sent => "sent",
            DeliveryOutcome::Skipped => "skipped",
            DeliveryOutcome::Rejected(_) => "rejected",
            DeliveryOutcome::TransportError => "transport_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("delivery endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Attempt delivery once. Never fails; the outcome is informational.
    async fn notify(&self, notification: Notification) -> DeliveryOutcome;
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    http_client: reqwest::Client,
    config: NotificationConfig,
}

impl NotificationDispatcher {
    pub fn new(http_client: reqwest::Client, config: NotificationConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn render_html(&self, notification: &Notification) -> String {
        format!(
            "<h1>Hi {name},</h1>\
             <p>You've received a new anonymous message:</p>\
             <blockquote>{content}</blockquote>\
             <p><a href=\"{inbox}\">View in your inbox</a></p>",
            name = escape_html(&notification.display_name),
            content = escape_html(&notification.content),
            inbox = escape_html(&self.config.inbox_url),
        )
    }

    async fn send(&self, api_key: &str, notification: &Notification) -> Result<(), NotifyError> {
        let payload = EmailPayload {
            from: &self.config.from,
            to: [notification.contact.as_str()],
            subject: &self.config.subject,
            html: self.render_html(notification),
        };

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn notify(&self, notification: Notification) -> DeliveryOutcome {
        let outcome = match self.config.api_key.as_deref() {
            None => {
                tracing::debug!("Delivery credential not configured, skipping notification");
                DeliveryOutcome::Skipped
            }
            Some(api_key) => match self.send(api_key, &notification).await {
                Ok(()) => {
                    tracing::info!("Notification email sent");
                    DeliveryOutcome::Sent
                }
                Err(NotifyError::Rejected { status, body }) => {
                    tracing::warn!(
                        status = status,
                        body = %body,
                        "Delivery endpoint rejected notification (dropped)"
                    );
                    DeliveryOutcome::Rejected(status)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to send notification (dropped)");
                    DeliveryOutcome::TransportError
                }
            },
        };

        NOTIFICATIONS_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();
        outcome
    }
}

/// Fire and forget. The task is unsupervised: no handle, no result channel.
pub fn dispatch_detached(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        notifier.notify(notification).await;
    });
}
