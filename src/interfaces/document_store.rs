use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::ids::DocumentId;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Members,
    SavingsEntries,
    LoanRequests,
    Payments,
    WithdrawalRequests,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Members => "members",
            Collection::SavingsEntries => "savings_entries",
            Collection::LoanRequests => "loan_requests",
            Collection::Payments => "payments",
            Collection::WithdrawalRequests => "withdrawal_requests",
        }
    }
}

/// Equality clauses plus an optional newest-first sort; the only query
/// shapes the ledger needs from the store.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
    newest_first: bool,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq<V: Serialize>(mut self, field: &str, value: V) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.clauses.push((field.to_string(), value));
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn wants_newest_first(&self) -> bool {
        self.newest_first
    }
}

#[derive(Clone, Debug)]
pub struct Document {
    pub id: DocumentId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub fields: Value,
}

impl Document {
    /// Decode into a typed record. Unknown-shaped input is rejected rather
    /// than accepted loosely.
    pub fn decode<T: DeserializeOwned>(&self, collection: Collection) -> Result<T> {
        serde_json::from_value(self.fields.clone()).map_err(|e| Error::MalformedDocument {
            collection,
            reason: e.to_string(),
        })
    }
}

pub fn encode<T: Serialize>(collection: Collection, record: &T) -> Result<Value> {
    serde_json::to_value(record).map_err(|e| Error::MalformedDocument {
        collection,
        reason: e.to_string(),
    })
}

/// The narrow boundary to the external document database. Single-document
/// atomicity only; nothing here spans collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>>;
    async fn get(&self, collection: Collection, id: DocumentId) -> Result<Document>;
    async fn create(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document>;
    async fn update(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document>;
}
