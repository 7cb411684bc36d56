//! # Validation
//!
//! Consensus validators. Expected-invalid input comes back as a
//! `ValidationResult`; only infrastructure failures are `Err`.

pub mod data_contract;
pub mod data_contract_create;
pub mod document;
pub mod documents_batch_basic;
pub mod documents_batch_state;
pub mod max_depth;
pub mod state_transition;
pub mod uniqueness;

pub use data_contract::{validate_indices, DataContractValidator};
pub use data_contract_create::DataContractCreateTransitionValidator;
pub use document::DocumentValidator;
pub use documents_batch_basic::DocumentsBatchBasicValidator;
pub use documents_batch_state::DocumentsBatchStateValidator;
pub use max_depth::validate_data_contract_max_depth;
pub use state_transition::StateTransitionValidator;
pub use uniqueness::validate_documents_uniqueness_by_indices;
