// ============================================================================
// Notification Configuration
// ============================================================================

use std::fmt;

use crate::constants::{
    DEFAULT_INBOX_URL, DEFAULT_NOTIFY_ENDPOINT, DEFAULT_NOTIFY_FROM, DEFAULT_NOTIFY_SUBJECT,
};

#[derive(Clone)]
pub struct NotificationConfig {
    /// Delivery credential; None disables email notifications
    pub api_key: Option<String>,
    pub endpoint: String,
    pub from: String,
    pub subject: String,
    /// Link rendered in the email body
    pub inbox_url: String,
}

impl NotificationConfig {
    pub(crate) fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> Self {
        let api_key = var("RESEND_API_KEY").filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::info!("RESEND_API_KEY not set, email notifications are disabled");
        }

        Self {
            api_key,
            endpoint: var("NOTIFY_ENDPOINT").unwrap_or_else(|| DEFAULT_NOTIFY_ENDPOINT.to_string()),
            from: var("NOTIFY_FROM").unwrap_or_else(|| DEFAULT_NOTIFY_FROM.to_string()),
            subject: var("NOTIFY_SUBJECT").unwrap_or_else(|| DEFAULT_NOTIFY_SUBJECT.to_string()),
            inbox_url: var("INBOX_URL").unwrap_or_else(|| DEFAULT_INBOX_URL.to_string()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_NOTIFY_ENDPOINT.to_string(),
            from: DEFAULT_NOTIFY_FROM.to_string(),
            subject: DEFAULT_NOTIFY_SUBJECT.to_string(),
            inbox_url: DEFAULT_INBOX_URL.to_string(),
        }
    }
}

impl fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint", &self.endpoint)
            .field("from", &self.from)
            .field("subject", &self.subject)
            .field("inbox_url", &self.inbox_url)
            .finish()
    }
}
