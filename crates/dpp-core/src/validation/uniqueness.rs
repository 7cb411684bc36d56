//! Storage-level uniqueness by indices.
//!
//! One query per unique index per Create or Replace transition. A match is
//! a collision unless it is the transition's own stored document.

use crate::domain::data_contract::DataContract;
use crate::domain::document::Document;
use crate::domain::document_transition::{Action, DocumentTransition};
use crate::domain::validation_result::ValidationResult;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::{DocumentQuery, StateRepository};
use futures::future::join_all;
use serde_json::Value;
use shared_types::Identifier;

/// Flags transitions whose unique index values are already taken in
/// storage.
pub async fn validate_documents_uniqueness_by_indices<R>(
    state_repository: &R,
    owner_id: &Identifier,
    transitions: &[&DocumentTransition],
    data_contract: &DataContract,
) -> Result<ValidationResult, DppError>
where
    R: StateRepository + ?Sized,
{
    let mut checks: Vec<(&DocumentTransition, &Value, DocumentQuery)> = Vec::new();
    for transition in transitions
        .iter()
        .copied()
        .filter(|transition| matches!(transition.action(), Action::Create | Action::Replace))
    {
        for index in data_contract.unique_indices(transition.document_type()) {
            checks.push((transition, index, index_query(transition, index, owner_id)));
        }
    }

    let data_contract_id = data_contract.id();
    let fetched = join_all(checks.iter().map(|(transition, _, query)| {
        state_repository.fetch_documents(&data_contract_id, transition.document_type(), query)
    }))
    .await;

    let mut result = ValidationResult::new();
    for ((transition, index, _), documents) in checks.iter().zip(fetched) {
        if collides(transition, &documents?) {
            result.add_error(ConsensusError::DuplicateDocument {
                document_id: transition.id(),
                document_type: transition.document_type().to_string(),
                index_definition: (*index).clone(),
            });
        }
    }
    Ok(result)
}

/// Equality query over the index properties, with `$ownerId` bound to the
/// batch owner and missing values bound to `null`.
fn index_query(transition: &DocumentTransition, index: &Value, owner_id: &Identifier) -> DocumentQuery {
    index
        .get("properties")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|property| property.as_object()?.keys().next())
        .fold(DocumentQuery::new(), |query, name| {
            let value = if name == "$ownerId" {
                owner_id.to_value()
            } else {
                transition.get(name).unwrap_or(Value::Null)
            };
            query.where_eq(name.clone(), value)
        })
}

fn collides(transition: &DocumentTransition, documents: &[Document]) -> bool {
    match documents {
        [] => false,
        [only] => only.id() != transition.id(),
        _ => true,
    }
}
