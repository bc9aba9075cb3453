// ============================================================================
// Inbox
// ============================================================================
//
// Recipient-side operations: list pending messages, history, reply, report,
// archive. Content that cannot be opened is returned as stored, never as an
// error.
//
// ============================================================================

use std::sync::Arc;

use uuid::Uuid;

use replied_crypto::Sealer;
use replied_error::{AppError, AppResult};
use replied_types::{HistoryEntry, Message, MessageStatus, NewReply};

use crate::repository::MessageRepository;

#[derive(Clone)]
pub struct InboxService {
    repository: MessageRepository,
    sealer: Arc<dyn Sealer>,
}

impl InboxService {
    pub fn new(repository: MessageRepository, sealer: Arc<dyn Sealer>) -> Self {
        Self { repository, sealer }
    }

    /// Pending messages for `owner`, newest first, with content opened
    pub async fn list_pending(&self, owner: Uuid) -> AppResult<Vec<Message>> {
        let messages = self
            .repository
            .messages_with_status(owner, MessageStatus::Pending)
            .await
            .map_err(|e| AppError::dependency("STORAGE_FAILED", e.to_string()))?;

        Ok(messages
            .into_iter()
            .map(|mut message| {
                self.open_in_place("message", message.id, &mut message.content);
                message
            })
            .collect())
    }

    /// Closed messages for `owner`, newest first, each with its replies
    pub async fn history(&self, owner: Uuid) -> AppResult<Vec<HistoryEntry>> {
        let messages = self
            .repository
            .closed_messages(owner)
            .await
            .map_err(|e| AppError::dependency("STORAGE_FAILED", e.to_string()))?;

        let mut entries = Vec::with_capacity(messages.len());
        for mut message in messages {
            let mut replies = self
                .repository
                .replies_for(message.id)
                .await
                .map_err(|e| AppError::dependency("STORAGE_FAILED", e.to_string()))?;

            self.open_in_place("message", message.id, &mut message.content);
            for reply in &mut replies {
                self.open_in_place("reply", reply.id, &mut reply.content);
            }
            entries.push(HistoryEntry { message, replies });
        }

        Ok(entries)
    }

    /// Mark the message replied, then store the sealed reply
    ///
    /// The status moves first so a pending message never has a stored reply.
    /// If the reply cannot be stored the message is put back to pending.
    pub async fn publish_reply(
        &self,
        owner: Uuid,
        message_id: Uuid,
        content: &str,
    ) -> AppResult<Uuid> {
        if content.trim().is_empty() {
            return Err(AppError::validation("content is required"));
        }

        let message = self.owned_message(owner, message_id).await?;
        ensure_transition(&message, MessageStatus::Replied)?;

        let sealed = self.sealer.seal(content).map_err(|e| {
            tracing::error!(error = %e, "Failed to encrypt reply");
            AppError::dependency("ENCRYPTION_FAILED", "Failed to encrypt reply")
        })?;

        self.repository
            .set_status(message_id, MessageStatus::Replied)
            .await
            .map_err(|e| AppError::dependency("STORAGE_FAILED", e.to_string()))?;

        let inserted = self
            .repository
            .insert_reply(&NewReply {
                message_id,
                sender_id: owner,
                content: sealed,
            })
            .await;

        let reply_id = match inserted {
            Ok(reply_id) => reply_id,
            Err(e) => {
                if let Err(revert) = self
                    .repository
                    .set_status(message_id, MessageStatus::Pending)
                    .await
                {
                    tracing::error!(
                        message_id = %message_id,
                        error = %revert,
                        "Failed to return message to pending after reply insert failed"
                    );
                }
                return Err(AppError::dependency("STORAGE_FAILED", e.to_string()));
            }
        };

        tracing::info!(message_id = %message_id, reply_id = %reply_id, "Reply published");
        Ok(reply_id)
    }

    /// Move an owned message to `next` (reported or archived)
    pub async fn set_status(
        &self,
        owner: Uuid,
        message_id: Uuid,
        next: MessageStatus,
    ) -> AppResult<()> {
        let message = self.owned_message(owner, message_id).await?;
        ensure_transition(&message, next)?;

        self.repository
            .set_status(message_id, next)
            .await
            .map_err(|e| AppError::dependency("STORAGE_FAILED", e.to_string()))?;

        tracing::info!(message_id = %message_id, status = %next, "Message status updated");
        Ok(())
    }

    /// Replace a sealed field with its plaintext, or leave it as stored
    fn open_in_place(&self, record: &'static str, id: Uuid, field: &mut String) {
        match self.sealer.open(field.as_str()) {
            Ok(plaintext) => *field = plaintext,
            Err(e) => {
                tracing::warn!(
                    record = record,
                    id = %id,
                    error = %e,
                    "Content unavailable, returning stored value"
                );
            }
        }
    }

    /// Messages belonging to someone else are indistinguishable from missing ones
    async fn owned_message(&self, owner: Uuid, message_id: Uuid) -> AppResult<Message> {
        let message = self
            .repository
            .find_message(message_id)
            .await
            .map_err(|e| AppError::dependency("STORAGE_FAILED", e.to_string()))?;

        match message {
            Some(message) if message.receiver_id == owner => Ok(message),
            _ => Err(AppError::not_found("message")),
        }
    }
}

fn ensure_transition(message: &Message, next: MessageStatus) -> AppResult<()> {
    if message.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::conflict(format!(
            "message is already {}",
            message.status
        )))
    }
}
