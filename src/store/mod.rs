// ============================================================================
// Record Store
// ============================================================================
//
// Generic interface to the external datastore. Records cross this boundary
// as loosely-typed JSON; the repository layer decodes them into typed
// records. Every call is a network round trip and may fail.
//
// ============================================================================

pub mod postgrest;

pub use postgrest::PostgrestStore;

use async_trait::async_trait;
use replied_types::DecodeError;
use serde_json::Value;
use thiserror::Error;

pub type Record = Value;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store transport error: {0}")]
    Transport(String),

    #[error("record store returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

/// Conjunction of column conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            op: FilterOp::Eq,
            value: value.to_string(),
        });
        self
    }

    pub fn neq(mut self, column: &str, value: impl ToString) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            op: FilterOp::Neq,
            value: value.to_string(),
        });
        self
    }

    /// Evaluate against a record, comparing scalar fields by their string form
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| {
            let field = match record.get(&c.column) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            };
            match c.op {
                FilterOp::Eq => field.as_deref() == Some(c.value.as_str()),
                FilterOp::Neq => field.as_deref() != Some(c.value.as_str()),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }
}

/// Storage interface for records
///
/// This trait allows for multiple implementations:
/// - PostgREST over HTTP (production)
/// - in-memory doubles (tests)
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record and return the identifier the store assigned
    async fn insert(&self, collection: &str, record: Record) -> Result<String, StoreError>;

    /// First record matching the filter
    async fn get(&self, collection: &str, filter: &Filter) -> Result<Option<Record>, StoreError>;

    /// Apply a partial update to the record with the given id
    async fn update(&self, collection: &str, id: &str, patch: Record) -> Result<(), StoreError>;

    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError>;
}
