//! Outbound Ports (Driven Ports)
//!
//! The host supplies persisted state and a JSON-Schema checker. Production
//! hosts back [`StateRepository`] with their ledger store; tests use
//! `InMemoryStateRepository`.

use crate::domain::data_contract::DataContract;
use crate::domain::document::Document;
use crate::domain::identity::Identity;
use crate::domain::validation_result::ValidationResult;
use crate::errors::StateRepositoryError;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::Identifier;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Equality clause `field == value` over a document's object form.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// System property (`$id`, `$ownerId`, ...) or dotted user path.
    pub field: String,
    /// Value in native form. `Null` matches a missing field.
    pub value: Value,
}

/// Conjunction of equality clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    /// Clauses that must all hold.
    pub where_clauses: Vec<WhereClause>,
}

impl DocumentQuery {
    /// Empty query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality clause.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.where_clauses.push(WhereClause {
            field: field.into(),
            value,
        });
        self
    }

    /// Whether `document` satisfies every clause.
    pub fn matches(&self, document: &Document) -> bool {
        self.where_clauses
            .iter()
            .all(|clause| document.get(&clause.field).unwrap_or(Value::Null) == clause.value)
    }
}

/// Persisted state (Driven Port).
///
/// Every method may fail with an infrastructure error; validators abort on
/// it instead of turning it into a consensus error.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Registered data contract by id.
    async fn fetch_data_contract(
        &self,
        id: &Identifier,
    ) -> Result<Option<Arc<DataContract>>, StateRepositoryError>;

    /// Stored documents of one type matching `query`.
    async fn fetch_documents(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StateRepositoryError>;

    /// Identity by id.
    async fn fetch_identity(&self, id: &Identifier)
        -> Result<Option<Identity>, StateRepositoryError>;

    /// Registers a data contract.
    async fn store_data_contract(&self, data_contract: DataContract)
        -> Result<(), StateRepositoryError>;

    /// Inserts or overwrites a document.
    async fn store_document(&self, document: Document) -> Result<(), StateRepositoryError>;

    /// Removes a document. Removing an absent document is not an error.
    async fn remove_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Result<(), StateRepositoryError>;
}

/// JSON-Schema checking capability (Driven Port).
///
/// Must report every violation, not just the first, and resolve `$ref`s
/// against `additional_schemas` keyed by their `$id`.
pub trait JsonSchemaValidator: Send + Sync {
    /// Validates `data` against `schema`.
    fn validate(
        &self,
        schema: &Value,
        data: &Value,
        additional_schemas: &BTreeMap<String, Value>,
    ) -> ValidationResult;
}

/// Wall clock (Driven Port).
///
/// Injected so document timestamps are deterministic under test.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}
