// ============================================================================
// Submission Pipeline
// ============================================================================
//
// Every inbound message passes these steps in order, stopping at the first
// rejection:
//
//   1. admission (per-source rate limit, fail-open)
//   2. global banned terms
//   3. recipient lookup
//   4. paused inbox
//   5. recipient blocked phrases
//   6. sender identity (best effort, never rejects)
//   7. thread integrity (only with a thread id)
//   8. seal content
//   9. persist as pending
//  10. notify, detached
//
// Steps 1-8 are bounded by the submission timeout and touch nothing
// persistent, so expiry simply abandons them. Step 9 is the point of no
// return and is never cancelled once started.
//
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use replied_config::{MAX_CONTENT_SIZE, SealFailurePolicy};
use replied_crypto::Sealer;
use replied_error::AppError;
use replied_metrics::{SEAL_FALLBACK_TOTAL, SUBMISSIONS_TOTAL, SUBMISSION_DURATION};
use replied_types::{NewMessage, RecipientPolicy};

use crate::content_guard::ContentGuard;
use crate::identity::IdentityProvider;
use crate::notification::{Notification, Notifier, dispatch_detached};
use crate::rate_limit::{Admission, AdmissionLimiter};
use crate::repository::MessageRepository;
use crate::thread_integrity::{ThreadIntegrityVerifier, ThreadVerdict};
use crate::utils::log_safe_id;

/// Raw submission as received from the transport
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    pub receiver_id: String,
    pub content: String,
    pub thread_id: Option<String>,
    /// Rate-limit bucket, normally the client IP
    pub source_key: String,
    pub bearer_token: Option<String>,
    /// Set when the transport could not decode the body
    pub malformed: Option<String>,
}

/// Why a submission was refused. Each variant has a stable reason code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    RateLimited,
    Invalid(String),
    ProhibitedContent,
    RecipientLookupFailed(String),
    InboxPaused,
    BlockedPhrase,
    ThreadIntegrity,
    ThreadLookupFailed(String),
    EncryptionFailed,
    StorageFailed(String),
    Timeout,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::RateLimited => "RATE_LIMITED",
            Rejection::Invalid(_) => "VALIDATION_ERROR",
            Rejection::ProhibitedContent => "PROHIBITED_CONTENT",
            Rejection::RecipientLookupFailed(_) => "RECIPIENT_LOOKUP_FAILED",
            Rejection::InboxPaused => "INBOX_PAUSED",
            Rejection::BlockedPhrase => "BLOCKED_PHRASE",
            Rejection::ThreadIntegrity => "THREAD_INTEGRITY",
            Rejection::ThreadLookupFailed(_) => "THREAD_LOOKUP_FAILED",
            Rejection::EncryptionFailed => "ENCRYPTION_FAILED",
            Rejection::StorageFailed(_) => "STORAGE_FAILED",
            Rejection::Timeout => "TIMEOUT",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Rejection::RateLimited => {
                "Too many messages sent. Please try again later.".to_string()
            }
            Rejection::Invalid(reason) => reason.clone(),
            Rejection::ProhibitedContent => "Message contains prohibited content".to_string(),
            Rejection::RecipientLookupFailed(detail) => {
                format!("Recipient lookup failed: {}", detail)
            }
            Rejection::InboxPaused => "This inbox is currently paused by the owner".to_string(),
            Rejection::BlockedPhrase => {
                "Message contains a phrase blocked by the recipient".to_string()
            }
            Rejection::ThreadIntegrity => {
                "Only the original sender can continue this thread".to_string()
            }
            Rejection::ThreadLookupFailed(detail) => format!("Thread lookup failed: {}", detail),
            Rejection::EncryptionFailed => "Failed to encrypt message".to_string(),
            Rejection::StorageFailed(detail) => format!("Failed to store message: {}", detail),
            Rejection::Timeout => "Submission timed out, please retry".to_string(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        let code = rejection.code();
        let message = rejection.message();
        match rejection {
            Rejection::RateLimited => AppError::TooManyRequests(message),
            Rejection::Invalid(reason) => AppError::Validation(reason),
            Rejection::ProhibitedContent
            | Rejection::InboxPaused
            | Rejection::BlockedPhrase
            | Rejection::ThreadIntegrity => AppError::forbidden(code, message),
            Rejection::Timeout => AppError::unavailable(code, message),
            Rejection::RecipientLookupFailed(_)
            | Rejection::ThreadLookupFailed(_)
            | Rejection::EncryptionFailed
            | Rejection::StorageFailed(_) => AppError::dependency(code, message),
        }
    }
}

/// Terminal success state of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub message_id: Uuid,
    pub sender_id: Option<Uuid>,
    /// false when the content was stored in plaintext after a seal failure
    pub sealed: bool,
}

/// Result of steps 1-8, ready to persist
struct Screened {
    message: NewMessage,
    policy: RecipientPolicy,
    sealed: bool,
}

#[derive(Clone)]
pub struct SubmissionOrchestrator {
    limiter: AdmissionLimiter,
    guard: ContentGuard,
    repository: MessageRepository,
    threads: ThreadIntegrityVerifier,
    identity: Arc<dyn IdentityProvider>,
    sealer: Arc<dyn Sealer>,
    notifier: Arc<dyn Notifier>,
    seal_failure_policy: SealFailurePolicy,
    timeout: Duration,
    log_salt: String,
}

impl SubmissionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        limiter: AdmissionLimiter,
        guard: ContentGuard,
        repository: MessageRepository,
        identity: Arc<dyn IdentityProvider>,
        sealer: Arc<dyn Sealer>,
        notifier: Arc<dyn Notifier>,
        seal_failure_policy: SealFailurePolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            guard,
            threads: ThreadIntegrityVerifier::new(repository.clone()),
            repository,
            identity,
            sealer,
            notifier,
            seal_failure_policy,
            timeout,
            log_salt: String::new(),
        }
    }

    pub fn with_log_salt(mut self, salt: &str) -> Self {
        self.log_salt = salt.to_string();
        self
    }

    pub async fn submit(&self, request: SubmissionRequest) -> Result<Accepted, Rejection> {
        let started = Instant::now();
        let result = self.run(request).await;

        let outcome = match &result {
            Ok(_) => "accepted",
            Err(rejection) => rejection.code(),
        };
        SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();
        SUBMISSION_DURATION.observe(started.elapsed().as_secs_f64());

        result
    }

    async fn run(&self, request: SubmissionRequest) -> Result<Accepted, Rejection> {
        let screened = match tokio::time::timeout(self.timeout, self.screen(&request)).await {
            Ok(screened) => screened?,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Submission timed out before persistence"
                );
                return Err(Rejection::Timeout);
            }
        };

        let message_id = self
            .repository
            .insert_message(&screened.message)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to persist message");
                Rejection::StorageFailed(e.to_string())
            })?;

        tracing::info!(
            message_id = %message_id,
            receiver = %log_safe_id(&screened.message.receiver_id.to_string(), &self.log_salt),
            anonymous = screened.message.sender_id.is_none(),
            threaded = screened.message.thread_id.is_some(),
            "Message accepted"
        );

        if let Some(notification) = self.notification_for(&screened.policy, &request.content) {
            dispatch_detached(self.notifier.clone(), notification);
        }

        Ok(Accepted {
            message_id,
            sender_id: screened.message.sender_id,
            sealed: screened.sealed,
        })
    }

    /// Steps 1-8. Nothing here writes to the record store.
    async fn screen(&self, request: &SubmissionRequest) -> Result<Screened, Rejection> {
        // 1. admission
        if self.limiter.admit(&request.source_key).await == Admission::Denied {
            return Err(Rejection::RateLimited);
        }

        let (receiver_id, thread_id) = validate(request)?;
        let content = request.content.as_str();

        // 2. global terms
        if self.guard.is_globally_prohibited(content) {
            tracing::info!(
                source = %log_safe_id(&request.source_key, &self.log_salt),
                "Rejected prohibited content"
            );
            return Err(Rejection::ProhibitedContent);
        }

        // 3. recipient
        let policy = match self.repository.recipient_policy(receiver_id).await {
            Ok(Some(policy)) => policy,
            Ok(None) => {
                return Err(Rejection::RecipientLookupFailed(
                    "recipient not found".to_string(),
                ));
            }
            Err(e) => {
                tracing::error!(error = %e, "Recipient lookup failed");
                return Err(Rejection::RecipientLookupFailed(e.to_string()));
            }
        };

        // 4. paused
        if policy.is_paused {
            return Err(Rejection::InboxPaused);
        }

        // 5. recipient phrases
        if self.guard.is_policy_blocked(content, &policy) {
            return Err(Rejection::BlockedPhrase);
        }

        // 6. sender identity
        let sender_id = self.resolve_sender(request.bearer_token.as_deref()).await;

        // 7. thread integrity
        if let Some(thread_id) = thread_id {
            match self.threads.verify(thread_id, sender_id).await {
                Ok(ThreadVerdict::Allow) => {}
                Ok(ThreadVerdict::Deny) => {
                    tracing::warn!(
                        thread_id = %thread_id,
                        "Thread continuation refused for a different sender"
                    );
                    return Err(Rejection::ThreadIntegrity);
                }
                Err(e) => {
                    tracing::error!(error = %e, thread_id = %thread_id, "Thread root lookup failed");
                    return Err(Rejection::ThreadLookupFailed(e.to_string()));
                }
            }
        }

        // 8. seal
        let (stored_content, sealed) = match self.sealer.seal(content) {
            Ok(token) => (token, true),
            Err(e) => match self.seal_failure_policy {
                SealFailurePolicy::StorePlaintext => {
                    tracing::warn!(error = %e, "Encryption failed, storing message unencrypted");
                    SEAL_FALLBACK_TOTAL.inc();
                    (content.to_string(), false)
                }
                SealFailurePolicy::Reject => {
                    tracing::error!(error = %e, "Encryption failed, rejecting submission");
                    return Err(Rejection::EncryptionFailed);
                }
            },
        };

        let mut message = NewMessage::pending(receiver_id, stored_content);
        message.sender_id = sender_id;
        message.thread_id = thread_id;

        Ok(Screened {
            message,
            policy,
            sealed,
        })
    }

    async fn resolve_sender(&self, token: Option<&str>) -> Option<Uuid> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;
        match self.identity.verify(token).await {
            Ok(principal) => Some(principal.user_id),
            Err(e) => {
                tracing::debug!(error = %e, "Sender token not accepted, sending anonymously");
                None
            }
        }
    }

    fn notification_for(&self, policy: &RecipientPolicy, content: &str) -> Option<Notification> {
        let sealed_contact = policy.sealed_contact()?;
        match self.sealer.open(sealed_contact) {
            Ok(contact) => Some(Notification {
                contact,
                display_name: policy.greeting_name().to_string(),
                content: content.to_string(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Recipient contact address unavailable, skipping notification");
                None
            }
        }
    }
}

fn validate(request: &SubmissionRequest) -> Result<(Uuid, Option<Uuid>), Rejection> {
    if let Some(reason) = &request.malformed {
        return Err(Rejection::Invalid(format!("malformed request body: {}", reason)));
    }
    if request.receiver_id.trim().is_empty() || request.content.trim().is_empty() {
        return Err(Rejection::Invalid(
            "receiver_id and content are required".to_string(),
        ));
    }
    if request.content.len() > MAX_CONTENT_SIZE {
        return Err(Rejection::Invalid(format!(
            "content exceeds {} bytes",
            MAX_CONTENT_SIZE
        )));
    }

    let receiver_id = Uuid::parse_str(request.receiver_id.trim())
        .map_err(|_| Rejection::Invalid("receiver_id is not a valid id".to_string()))?;

    let thread_id = match request.thread_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| Rejection::Invalid("thread_id is not a valid id".to_string()))?,
        ),
    };

    Ok((receiver_id, thread_id))
}
