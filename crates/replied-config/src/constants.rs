// ============================================================================
// Configuration Constants
// ============================================================================

pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_RUST_LOG: &str = "info";
pub(crate) const DEFAULT_LOG_HASH_SALT: &str = "replied-log-salt";

// Admission: 5 sends per 10 minutes per source IP
pub(crate) const DEFAULT_RATE_LIMIT_MAX_SENDS: u32 = 5;
pub(crate) const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 10 * SECONDS_PER_MINUTE as u64;
pub(crate) const DEFAULT_RATE_LIMIT_KEY_PREFIX: &str = "ratelimit:send:";

pub(crate) const DEFAULT_SUBMISSION_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

// Notification defaults
pub(crate) const DEFAULT_NOTIFY_ENDPOINT: &str = "https://api.resend.com/emails";
pub(crate) const DEFAULT_NOTIFY_FROM: &str = "Replied <noreply@marvlock.dev>";
pub(crate) const DEFAULT_NOTIFY_SUBJECT: &str = "New Anonymous Message Received!";
pub(crate) const DEFAULT_INBOX_URL: &str = "http://localhost:3000/inbox";

pub(crate) const SECONDS_PER_MINUTE: i64 = 60;

// Upper bound on a submitted message body (bytes)
pub const MAX_CONTENT_SIZE: usize = 16 * 1024;
