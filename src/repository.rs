// ============================================================================
// Message Repository
// ============================================================================
//
// Typed access to the collections the pipeline touches. Decoding happens
// here so a malformed record surfaces as DecodeError instead of travelling
// further as an untyped map. Listings decode row by row and leave out rows
// that do not decode.
//
// ============================================================================

use std::sync::Arc;

use replied_metrics::RECORDS_SKIPPED_TOTAL;
use replied_types::{
    DecodeError, Message, MessageStatus, NewMessage, NewReply, RecipientPolicy, Reply, ThreadRoot,
    decode,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::store::{Filter, Order, Record, RecordStore, StoreError};

pub const MESSAGES: &str = "messages";
pub const PROFILES: &str = "profiles";
pub const REPLIES: &str = "replies";

#[derive(Clone)]
pub struct MessageRepository {
    store: Arc<dyn RecordStore>,
}

impl MessageRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Snapshot of the recipient's inbox settings, None if no such profile
    pub async fn recipient_policy(
        &self,
        receiver_id: Uuid,
    ) -> Result<Option<RecipientPolicy>, StoreError> {
        let record = self
            .store
            .get(PROFILES, &Filter::new().eq("id", receiver_id))
            .await?;

        record
            .map(|r| decode("profile", r).map_err(StoreError::from))
            .transpose()
    }

    /// Earliest message carrying this thread id
    pub async fn thread_root(&self, thread_id: Uuid) -> Result<Option<ThreadRoot>, StoreError> {
        let rows = self
            .store
            .query(
                MESSAGES,
                &Filter::new().eq("thread_id", thread_id),
                Some(&Order::asc("created_at")),
                Some(1),
            )
            .await?;

        rows.into_iter()
            .next()
            .map(|r| decode("thread root", r).map_err(StoreError::from))
            .transpose()
    }

    pub async fn insert_message(&self, message: &NewMessage) -> Result<Uuid, StoreError> {
        let record = serde_json::to_value(message).map_err(|source| DecodeError::Record {
            record: "message",
            source,
        })?;
        let id = self.store.insert(MESSAGES, record).await?;
        parse_id("message id", id)
    }

    pub async fn find_message(&self, id: Uuid) -> Result<Option<Message>, StoreError> {
        let record = self.store.get(MESSAGES, &Filter::new().eq("id", id)).await?;
        record
            .map(|r| decode("message", r).map_err(StoreError::from))
            .transpose()
    }

    /// Messages for a receiver in the given status, newest first
    pub async fn messages_with_status(
        &self,
        receiver_id: Uuid,
        status: MessageStatus,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = self
            .store
            .query(
                MESSAGES,
                &Filter::new()
                    .eq("receiver_id", receiver_id)
                    .eq("status", status),
                Some(&Order::desc("created_at")),
                None,
            )
            .await?;

        Ok(decode_rows("message", rows))
    }

    /// Messages for a receiver that are no longer pending, newest first
    pub async fn closed_messages(&self, receiver_id: Uuid) -> Result<Vec<Message>, StoreError> {
        let rows = self
            .store
            .query(
                MESSAGES,
                &Filter::new()
                    .eq("receiver_id", receiver_id)
                    .neq("status", MessageStatus::Pending),
                Some(&Order::desc("created_at")),
                None,
            )
            .await?;

        Ok(decode_rows("message", rows))
    }

    /// Replies to a message, oldest first
    pub async fn replies_for(&self, message_id: Uuid) -> Result<Vec<Reply>, StoreError> {
        let rows = self
            .store
            .query(
                REPLIES,
                &Filter::new().eq("message_id", message_id),
                Some(&Order::asc("created_at")),
                None,
            )
            .await?;

        Ok(decode_rows("reply", rows))
    }

    pub async fn set_status(&self, id: Uuid, status: MessageStatus) -> Result<(), StoreError> {
        self.store
            .update(MESSAGES, &id.to_string(), json!({ "status": status }))
            .await
    }

    pub async fn insert_reply(&self, reply: &NewReply) -> Result<Uuid, StoreError> {
        let record = serde_json::to_value(reply).map_err(|source| DecodeError::Record {
            record: "reply",
            source,
        })?;
        let id = self.store.insert(REPLIES, record).await?;
        parse_id("reply id", id)
    }
}

fn decode_rows<T: DeserializeOwned>(record: &'static str, rows: Vec<Record>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").and_then(|v| v.as_str()).map(str::to_string);
            match decode(record, row) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(
                        record = record,
                        id = id.as_deref().unwrap_or("unknown"),
                        error = %e,
                        "Skipping undecodable record"
                    );
                    RECORDS_SKIPPED_TOTAL.with_label_values(&[record]).inc();
                    None
                }
            }
        })
        .collect()
}

fn parse_id(record: &'static str, id: String) -> Result<Uuid, StoreError> {
    Ok(decode(record, serde_json::Value::String(id))?)
}
