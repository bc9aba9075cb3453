// ============================================================================
// Replied Types - Core Data Types
// ============================================================================
//
// Typed records exchanged with the record store and the identity provider.
// No business logic, no I/O.
//
// Contents:
// - Message / Reply records, history entries and the status lifecycle
// - Recipient policy snapshot and thread root
// - Authenticated principal
// - DecodeError for records that do not match their schema
//
// ============================================================================

pub mod message;
pub mod profile;

pub use message::*;
pub use profile::*;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// A record returned by the store did not have the expected shape
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode {record} record: {source}")]
    Record {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a loosely-typed store record into its typed form
pub fn decode<T: DeserializeOwned>(
    record: &'static str,
    value: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError::Record { record, source })
}
