//! # Domain Layer
//!
//! Pure entities, value objects and algorithms. Nothing in here performs
//! I/O; persisted state and schema checking are reached through
//! [`crate::ports`].

pub mod applier;
pub mod data_contract;
pub mod data_contract_create_transition;
pub mod document;
pub mod document_transition;
pub mod documents_batch_transition;
pub mod duplicates;
pub mod encoded_properties;
pub mod enrichment;
pub mod entropy;
pub mod identifiers;
pub mod identity;
pub mod integral;
pub mod limits;
pub mod property_path;
pub mod schemas;
pub mod state_transition;
pub mod validation_result;

pub use applier::{apply_document_transition, apply_to_documents};
pub use data_contract::DataContract;
pub use data_contract_create_transition::DataContractCreateTransition;
pub use document::Document;
pub use document_transition::{
    Action, DocumentCreateTransition, DocumentDeleteTransition, DocumentReplaceTransition,
    DocumentTransition,
};
pub use documents_batch_transition::DocumentsBatchTransition;
pub use encoded_properties::{ContentEncoding, EncodedProperties};
pub use identity::{Identity, IdentityPublicKey, KeyType};
pub use state_transition::{StateTransition, StateTransitionLike, StateTransitionType};
pub use validation_result::ValidationResult;
