//! # Data Contract Create Validation
//!
//! Basic validation works on the raw object form and needs no state:
//!
//! 1. Transition envelope schema (stops on failure)
//! 2. Full data contract validation of `dataContract` (stops on failure)
//! 3. Entropy randomness
//! 4. Contract id against `ownerId` and entropy
//!
//! State validation rejects a contract id that is already registered.

use super::data_contract::DataContractValidator;
use crate::config::PlatformConfig;
use crate::domain::data_contract_create_transition::DataContractCreateTransition;
use crate::domain::entropy;
use crate::domain::identifiers::generate_data_contract_id;
use crate::domain::schemas::DATA_CONTRACT_CREATE_TRANSITION_SCHEMA;
use crate::domain::validation_result::ValidationResult;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::{JsonSchemaValidator, StateRepository};
use serde_json::Value;
use shared_types::Identifier;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Validator for data contract create transitions.
pub struct DataContractCreateTransitionValidator<V: JsonSchemaValidator, R: StateRepository> {
    json_schema_validator: Arc<V>,
    state_repository: Arc<R>,
    data_contract_validator: DataContractValidator<V>,
}

impl<V: JsonSchemaValidator, R: StateRepository> DataContractCreateTransitionValidator<V, R> {
    /// Creates a validator.
    pub fn new(json_schema_validator: Arc<V>, state_repository: Arc<R>, config: PlatformConfig) -> Self {
        Self {
            data_contract_validator: DataContractValidator::new(
                Arc::clone(&json_schema_validator),
                config,
            ),
            json_schema_validator,
            state_repository,
        }
    }

    /// Structural validation of the raw transition.
    pub fn validate_basic(&self, raw_transition: &Value) -> ValidationResult {
        let result = self.json_schema_validator.validate(
            &DATA_CONTRACT_CREATE_TRANSITION_SCHEMA,
            raw_transition,
            &BTreeMap::new(),
        );
        if !result.is_valid() {
            return result;
        }

        let raw_data_contract = &raw_transition["dataContract"];
        let mut result = self.data_contract_validator.validate(raw_data_contract);
        if !result.is_valid() {
            return result;
        }

        let entropy_text = raw_transition["entropy"].as_str().unwrap_or_default();
        let invalid_entropy = || ConsensusError::InvalidDataContractEntropy {
            entropy: entropy_text.to_string(),
        };
        let Some(entropy_bytes) = entropy::decode(entropy_text) else {
            return invalid_entropy().into();
        };
        if !entropy::is_valid(entropy_text) {
            result.add_error(invalid_entropy());
        }

        // The meta-schema already pinned ownerId to the identifier pattern.
        if let Ok(owner_id) = Identifier::from_value(&raw_data_contract["ownerId"]) {
            let expected_id = generate_data_contract_id(&owner_id, &entropy_bytes);
            let actual_id = raw_data_contract["$id"].as_str().unwrap_or_default();
            if actual_id != expected_id.to_hex() {
                result.add_error(ConsensusError::InvalidDataContractId {
                    expected_id,
                    actual_id: actual_id.to_string(),
                });
            }
        }

        result
    }

    /// Rejects a contract that is already registered.
    #[instrument(skip(self, transition), fields(data_contract_id = %transition.data_contract().id()))]
    pub async fn validate_state(
        &self,
        transition: &DataContractCreateTransition,
    ) -> Result<ValidationResult, DppError> {
        let data_contract_id = transition.data_contract().id();
        let existing = self
            .state_repository
            .fetch_data_contract(&data_contract_id)
            .await?;

        debug!(present = existing.is_some(), "[dpp] data contract state checked");
        Ok(match existing {
            Some(_) => ConsensusError::DataContractAlreadyPresent { data_contract_id }.into(),
            None => ValidationResult::new(),
        })
    }
}
