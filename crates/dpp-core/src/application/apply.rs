//! # State Transition Application
//!
//! Applies transitions that already passed validation. Documents batches
//! run against the live store in batch order: each transition reads the
//! store as left by the previous one, so `[Create(A), Replace(A)]` works
//! within one batch.
//!
//! Precondition violations come back as `DppError::Apply`; they mean the
//! caller skipped or misordered validation. Every contract a batch
//! references must already be registered.

use crate::domain::applier::apply_document_transition;
use crate::domain::data_contract_create_transition::DataContractCreateTransition;
use crate::domain::documents_batch_transition::DocumentsBatchTransition;
use crate::domain::state_transition::{StateTransition, StateTransitionLike};
use crate::errors::{ApplyError, DppError};
use crate::ports::outbound::{DocumentQuery, StateRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Writes validated state transitions.
pub struct StateTransitionApplier<R: StateRepository> {
    state_repository: Arc<R>,
}

impl<R: StateRepository> StateTransitionApplier<R> {
    /// Creates an applier over `state_repository`.
    pub fn new(state_repository: Arc<R>) -> Self {
        Self { state_repository }
    }

    /// Applies a transition of any kind.
    pub async fn apply_state_transition(&self, transition: &StateTransition) -> Result<(), DppError> {
        match transition {
            StateTransition::DataContractCreate(transition) => {
                self.apply_data_contract_create_transition(transition).await
            }
            StateTransition::DocumentsBatch(batch) => {
                self.apply_documents_batch_transition(batch).await
            }
        }
    }

    /// Registers the contract.
    #[instrument(skip(self, transition), fields(data_contract_id = %transition.data_contract().id()))]
    pub async fn apply_data_contract_create_transition(
        &self,
        transition: &DataContractCreateTransition,
    ) -> Result<(), DppError> {
        self.state_repository
            .store_data_contract(transition.data_contract().clone())
            .await?;
        info!("[dpp] data contract registered");
        Ok(())
    }

    /// Applies every transition in batch order against the live store.
    #[instrument(skip(self, batch), fields(owner_id = %batch.owner_id(), transitions = batch.transitions().len()))]
    pub async fn apply_documents_batch_transition(
        &self,
        batch: &DocumentsBatchTransition,
    ) -> Result<(), DppError> {
        let mut known_contracts = HashSet::new();
        for transition in batch.transitions() {
            let data_contract_id = transition.data_contract_id();
            if !known_contracts.contains(&data_contract_id) {
                if self
                    .state_repository
                    .fetch_data_contract(&data_contract_id)
                    .await?
                    .is_none()
                {
                    return Err(ApplyError::DataContractNotProvided { data_contract_id }.into());
                }
                known_contracts.insert(data_contract_id);
            }

            let document_id = transition.id();
            let query = DocumentQuery::new().where_eq("$id", document_id.to_value());
            let existing = self
                .state_repository
                .fetch_documents(&data_contract_id, transition.document_type(), &query)
                .await?
                .into_iter()
                .next();

            match apply_document_transition(transition, batch.owner_id(), existing)? {
                Some(document) => self.state_repository.store_document(document).await?,
                None => {
                    self.state_repository
                        .remove_document(&data_contract_id, transition.document_type(), &document_id)
                        .await?
                }
            }
            debug!(%document_id, action = ?transition.action(), "[dpp] document transition applied");
        }
        Ok(())
    }
}
