use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// MessageStatus - lifecycle of an inbox message
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Pending,
    Replied,
    Archived,
    Reported,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Replied => "replied",
            MessageStatus::Archived => "archived",
            MessageStatus::Reported => "reported",
        }
    }

    /// Transitions are monotonic: only a pending message may move, and only
    /// to one of the closed states.
    pub fn can_transition_to(&self, next: MessageStatus) -> bool {
        matches!(self, MessageStatus::Pending) && next != MessageStatus::Pending
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Message - a stored inbox message
// ============================================================================

/// Message as stored. `content` holds the sealed token at rest and the
/// opened plaintext once a read path has decrypted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub receiver_id: Uuid,
    #[serde(default)]
    pub sender_id: Option<Uuid>,
    pub content: String,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub thread_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new message. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub receiver_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<Uuid>,
    pub content: String,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Uuid>,
}

impl NewMessage {
    pub fn pending(receiver_id: Uuid, content: String) -> Self {
        Self {
            receiver_id,
            sender_id: None,
            content,
            status: MessageStatus::Pending,
            thread_id: None,
        }
    }
}

/// Earliest message of a thread; only the sender matters for integrity checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRoot {
    #[serde(default)]
    pub sender_id: Option<Uuid>,
}

// ============================================================================
// Reply
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReply {
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

/// A closed message together with the replies sent to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub message: Message,
    pub replies: Vec<Reply>,
}
