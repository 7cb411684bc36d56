//! # Documents Batch State Validation
//!
//! Checks a parsed batch against persisted state. Read-only: nothing is
//! written to the repository.
//!
//! Per data contract group, in batch order:
//!
//! | Action | Stored document | Error |
//! |--------|-----------------|-------|
//! | Create | present | `DocumentAlreadyPresent` |
//! | Replace, Delete | absent | `DocumentNotFound` |
//! | Replace | revision != stored + 1 | `InvalidDocumentRevision` |
//! | Replace, Delete | other owner | `InvalidDocumentOwner` |
//!
//! When the group passes, unique indices are checked against storage.

use super::uniqueness::validate_documents_uniqueness_by_indices;
use crate::domain::document::Document;
use crate::domain::document_transition::DocumentTransition;
use crate::domain::documents_batch_transition::DocumentsBatchTransition;
use crate::domain::state_transition::StateTransitionLike;
use crate::domain::validation_result::ValidationResult;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::{DocumentQuery, StateRepository};
use futures::future::join_all;
use shared_types::Identifier;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// State validator for documents batches.
pub struct DocumentsBatchStateValidator<R: StateRepository> {
    state_repository: Arc<R>,
}

impl<R: StateRepository> DocumentsBatchStateValidator<R> {
    /// Creates a validator.
    pub fn new(state_repository: Arc<R>) -> Self {
        Self { state_repository }
    }

    /// Validates `batch` against the repository.
    #[instrument(skip(self, batch), fields(owner_id = %batch.owner_id()))]
    pub async fn validate(
        &self,
        batch: &DocumentsBatchTransition,
    ) -> Result<ValidationResult, DppError> {
        let mut groups: Vec<(Identifier, Vec<&DocumentTransition>)> = Vec::new();
        let mut positions: HashMap<Identifier, usize> = HashMap::new();
        for transition in batch.transitions() {
            let data_contract_id = transition.data_contract_id();
            let position = *positions.entry(data_contract_id).or_insert_with(|| {
                groups.push((data_contract_id, Vec::new()));
                groups.len() - 1
            });
            groups[position].1.push(transition);
        }

        let owner_id = batch.owner_id();
        let group_results = join_all(groups.iter().map(|(data_contract_id, transitions)| {
            self.validate_group(*data_contract_id, transitions, owner_id)
        }))
        .await;

        let mut result = ValidationResult::new();
        for group_result in group_results {
            result.merge(group_result?);
        }
        debug!(
            errors = result.errors().len(),
            "[dpp] documents batch state validation finished"
        );
        Ok(result)
    }

    async fn validate_group(
        &self,
        data_contract_id: Identifier,
        transitions: &[&DocumentTransition],
        owner_id: Identifier,
    ) -> Result<ValidationResult, DppError> {
        let Some(data_contract) = self
            .state_repository
            .fetch_data_contract(&data_contract_id)
            .await?
        else {
            return Ok(ConsensusError::DataContractNotPresent { data_contract_id }.into());
        };

        let queries: Vec<DocumentQuery> = transitions
            .iter()
            .map(|transition| DocumentQuery::new().where_eq("$id", transition.id().to_value()))
            .collect();
        let fetched = join_all(transitions.iter().zip(&queries).map(|(transition, query)| {
            self.state_repository
                .fetch_documents(&data_contract_id, transition.document_type(), query)
        }))
        .await;

        let mut result = ValidationResult::new();
        for (transition, documents) in transitions.iter().zip(fetched) {
            let stored = documents?.into_iter().next();
            result.add_errors(check_against_stored(transition, stored.as_ref(), &owner_id));
        }
        if !result.is_valid() {
            return Ok(result);
        }

        validate_documents_uniqueness_by_indices(
            self.state_repository.as_ref(),
            &owner_id,
            transitions,
            &data_contract,
        )
        .await
    }
}

fn check_against_stored(
    transition: &DocumentTransition,
    stored: Option<&Document>,
    owner_id: &Identifier,
) -> Vec<ConsensusError> {
    let document_id = transition.id();
    let mut errors = Vec::new();

    match (transition, stored) {
        (DocumentTransition::Create(_), Some(_)) => {
            errors.push(ConsensusError::DocumentAlreadyPresent { document_id });
        }
        (DocumentTransition::Create(_), None) => {}
        (DocumentTransition::Replace(_) | DocumentTransition::Delete(_), None) => {
            errors.push(ConsensusError::DocumentNotFound { document_id });
        }
        (DocumentTransition::Replace(replace), Some(document)) => {
            if replace.revision != document.revision() + 1 {
                errors.push(ConsensusError::InvalidDocumentRevision {
                    document_id,
                    current_revision: document.revision(),
                    declared_revision: replace.revision,
                });
            }
            check_owner(document, owner_id, &mut errors);
        }
        (DocumentTransition::Delete(_), Some(document)) => {
            check_owner(document, owner_id, &mut errors);
        }
    }
    errors
}

fn check_owner(document: &Document, owner_id: &Identifier, errors: &mut Vec<ConsensusError>) {
    if document.owner_id() != *owner_id {
        errors.push(ConsensusError::InvalidDocumentOwner {
            document_id: document.id(),
            document_owner_id: document.owner_id(),
            owner_id: *owner_id,
        });
    }
}
