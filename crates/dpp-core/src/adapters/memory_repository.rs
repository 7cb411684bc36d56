//! In-memory state repository.
//!
//! Backs unit and integration tests and single-process hosts. Documents are
//! keyed by `(data contract id, type, document id)` so per-type scans are
//! range reads.

use crate::domain::data_contract::DataContract;
use crate::domain::document::Document;
use crate::domain::identity::Identity;
use crate::errors::StateRepositoryError;
use crate::ports::outbound::{DocumentQuery, StateRepository};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Identifier;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

type DocumentKey = (Identifier, String, Identifier);

/// Thread-safe in-memory [`StateRepository`].
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    data_contracts: RwLock<HashMap<Identifier, Arc<DataContract>>>,
    documents: RwLock<BTreeMap<DocumentKey, Document>>,
    identities: RwLock<HashMap<Identifier, Identity>>,
    unavailable: AtomicBool,
}

impl InMemoryStateRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identity.
    pub fn insert_identity(&self, identity: Identity) {
        self.identities.write().insert(identity.id(), identity);
    }

    /// Registers a data contract without going through the trait.
    pub fn insert_data_contract(&self, data_contract: DataContract) {
        self.data_contracts
            .write()
            .insert(data_contract.id(), Arc::new(data_contract));
    }

    /// Stores a document without going through the trait.
    pub fn insert_document(&self, document: Document) {
        self.documents.write().insert(key_of(&document), document);
    }

    /// Stored document by id, if any.
    pub fn get_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Option<Document> {
        self.documents
            .read()
            .get(&(*data_contract_id, document_type.to_string(), *id))
            .cloned()
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    /// Makes every subsequent call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StateRepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StateRepositoryError::Unavailable(
                "in-memory repository switched off".into(),
            ));
        }
        Ok(())
    }
}

fn key_of(document: &Document) -> DocumentKey {
    (
        document.data_contract_id(),
        document.document_type().to_string(),
        document.id(),
    )
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn fetch_data_contract(
        &self,
        id: &Identifier,
    ) -> Result<Option<Arc<DataContract>>, StateRepositoryError> {
        self.ensure_available()?;
        Ok(self.data_contracts.read().get(id).cloned())
    }

    async fn fetch_documents(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StateRepositoryError> {
        self.ensure_available()?;
        let lower = (*data_contract_id, document_type.to_string(), Identifier::new([0u8; 32]));
        let upper = (*data_contract_id, document_type.to_string(), Identifier::new([0xff; 32]));

        let documents: Vec<Document> = self
            .documents
            .read()
            .range(lower..=upper)
            .map(|(_, document)| document)
            .filter(|document| query.matches(document))
            .cloned()
            .collect();
        debug!(
            document_type,
            matches = documents.len(),
            "[dpp] fetched documents"
        );
        Ok(documents)
    }

    async fn fetch_identity(
        &self,
        id: &Identifier,
    ) -> Result<Option<Identity>, StateRepositoryError> {
        self.ensure_available()?;
        Ok(self.identities.read().get(id).cloned())
    }

    async fn store_data_contract(
        &self,
        data_contract: DataContract,
    ) -> Result<(), StateRepositoryError> {
        self.ensure_available()?;
        self.insert_data_contract(data_contract);
        Ok(())
    }

    async fn store_document(&self, document: Document) -> Result<(), StateRepositoryError> {
        self.ensure_available()?;
        self.insert_document(document);
        Ok(())
    }

    async fn remove_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        id: &Identifier,
    ) -> Result<(), StateRepositoryError> {
        self.ensure_available()?;
        self.documents
            .write()
            .remove(&(*data_contract_id, document_type.to_string(), *id));
        Ok(())
    }
}
