//! # Document Transition Applier
//!
//! Pure state machine turning a transition plus an optional prior document
//! into the resulting document, or `None` for a delete.
//!
//! | Action | Precondition | Effect |
//! |--------|--------------|--------|
//! | Create | no prior document | new document at revision 1 |
//! | Replace | prior document | declared revision and new data |
//! | Delete | prior document | removal |
//!
//! The applier trusts the validated `$revision` and does not increment it.

use super::document::Document;
use super::document_transition::DocumentTransition;
use super::documents_batch_transition::DocumentsBatchTransition;
use super::limits::INITIAL_REVISION;
use super::state_transition::StateTransitionLike;
use crate::errors::ApplyError;
use shared_types::Identifier;
use std::collections::HashMap;

/// Applies one transition.
pub fn apply_document_transition(
    transition: &DocumentTransition,
    owner_id: Identifier,
    existing: Option<Document>,
) -> Result<Option<Document>, ApplyError> {
    match transition {
        DocumentTransition::Create(create) => {
            if existing.is_some() {
                return Err(ApplyError::DocumentAlreadyExists {
                    document_id: create.id,
                });
            }
            let mut document = Document::new(
                create.id,
                create.document_type.clone(),
                create.data_contract_id,
                owner_id,
                INITIAL_REVISION,
                create.created_at,
                create.updated_at,
                create.data.clone(),
            );
            document.set_entropy(Some(create.entropy.clone()));
            Ok(Some(document))
        }
        DocumentTransition::Replace(replace) => {
            let mut document = existing.ok_or(ApplyError::DocumentNotProvided {
                document_id: replace.id,
            })?;
            document.set_revision(replace.revision);
            document.set_data(replace.data.clone());
            if replace.updated_at.is_some() {
                document.set_updated_at(replace.updated_at);
            }
            Ok(Some(document))
        }
        DocumentTransition::Delete(delete) => {
            if existing.is_none() {
                return Err(ApplyError::DocumentNotProvided {
                    document_id: delete.id,
                });
            }
            Ok(None)
        }
    }
}

/// Applies every transition of `batch` against a fixed snapshot.
///
/// Each transition sees `documents` as given; earlier transitions of the
/// batch are not visible to later ones. Results keep batch order.
pub fn apply_to_documents(
    batch: &DocumentsBatchTransition,
    documents: &HashMap<Identifier, Document>,
) -> Result<Vec<(Identifier, Option<Document>)>, ApplyError> {
    batch
        .transitions()
        .iter()
        .map(|transition| {
            let existing = documents.get(&transition.id()).cloned();
            let result = apply_document_transition(transition, batch.owner_id(), existing)?;
            Ok((transition.id(), result))
        })
        .collect()
}
