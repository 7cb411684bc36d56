//! # State Transition Validation
//!
//! Single entry point over every state transition kind.
//!
//! | Entry point | Input | Checks |
//! |-------------|-------|--------|
//! | `validate_structure` | raw object | type, kind-specific basic rules, size, identity, signature |
//! | `validate_data` | parsed transition | kind-specific state rules |
//! | `validate` | raw object | structure, then data |
//!
//! Each stage stops the pipeline when it reports errors.

use super::data_contract_create::DataContractCreateTransitionValidator;
use super::documents_batch_basic::DocumentsBatchBasicValidator;
use super::documents_batch_state::DocumentsBatchStateValidator;
use crate::config::PlatformConfig;
use crate::domain::integral;
use crate::domain::state_transition::{StateTransition, StateTransitionLike, StateTransitionType};
use crate::domain::validation_result::ValidationResult;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::{JsonSchemaValidator, StateRepository};
use serde_json::Value;
use shared_types::{codec, CodecError};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Validation facade for raw and parsed state transitions.
pub struct StateTransitionValidator<V: JsonSchemaValidator, R: StateRepository> {
    state_repository: Arc<R>,
    data_contract_create: DataContractCreateTransitionValidator<V, R>,
    documents_batch_basic: DocumentsBatchBasicValidator<V, R>,
    documents_batch_state: DocumentsBatchStateValidator<R>,
}

impl<V: JsonSchemaValidator, R: StateRepository> StateTransitionValidator<V, R> {
    /// Wires the per-kind validators around shared capabilities.
    pub fn new(json_schema_validator: Arc<V>, state_repository: Arc<R>, config: PlatformConfig) -> Self {
        Self {
            data_contract_create: DataContractCreateTransitionValidator::new(
                Arc::clone(&json_schema_validator),
                Arc::clone(&state_repository),
                config,
            ),
            documents_batch_basic: DocumentsBatchBasicValidator::new(
                json_schema_validator,
                Arc::clone(&state_repository),
            ),
            documents_batch_state: DocumentsBatchStateValidator::new(Arc::clone(&state_repository)),
            state_repository,
        }
    }

    /// Structural validation of a raw state transition, including the
    /// signature against the owner identity.
    #[instrument(skip(self, raw_transition))]
    pub async fn validate_structure(
        &self,
        raw_transition: &Value,
    ) -> Result<ValidationResult, DppError> {
        let Some(type_value) = raw_transition.get("type") else {
            return Ok(ConsensusError::MissingStateTransitionType.into());
        };
        let Some(transition_type) = integral::as_u64(type_value).and_then(StateTransitionType::from_code)
        else {
            return Ok(ConsensusError::InvalidStateTransitionType {
                state_transition_type: type_value.clone(),
            }
            .into());
        };

        let result = match transition_type {
            StateTransitionType::DataContractCreate => {
                self.data_contract_create.validate_basic(raw_transition)
            }
            StateTransitionType::DocumentsBatch => {
                self.documents_batch_basic.validate(raw_transition).await?
            }
        };
        if !result.is_valid() {
            return Ok(result);
        }

        if let Err(error) = codec::encode(raw_transition) {
            return Ok(match error {
                CodecError::MaxEncodedBytesReached { size, max_size } => {
                    ConsensusError::StateTransitionMaxSizeExceeded { size, max_size }
                }
                other => ConsensusError::SerializedObjectParsing {
                    message: other.to_string(),
                },
            }
            .into());
        }

        let transition = StateTransition::from_object(raw_transition)?;
        self.validate_signature(&transition).await
    }

    /// State validation of a parsed transition. Reads state, never writes.
    pub async fn validate_data(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, DppError> {
        match transition {
            StateTransition::DataContractCreate(transition) => {
                self.data_contract_create.validate_state(transition).await
            }
            StateTransition::DocumentsBatch(batch) => {
                self.documents_batch_state.validate(batch).await
            }
        }
    }

    /// Structure, then data.
    pub async fn validate(&self, raw_transition: &Value) -> Result<ValidationResult, DppError> {
        let result = self.validate_structure(raw_transition).await?;
        if !result.is_valid() {
            return Ok(result);
        }
        let transition = StateTransition::from_object(raw_transition)?;
        self.validate_data(&transition).await
    }

    async fn validate_signature(
        &self,
        transition: &StateTransition,
    ) -> Result<ValidationResult, DppError> {
        let identity_id = transition.owner_id();
        let Some(identity) = self.state_repository.fetch_identity(&identity_id).await? else {
            return Ok(ConsensusError::IdentityNotFound { identity_id }.into());
        };

        let public_key_id = transition.signature_public_key_id().unwrap_or_default();
        let Some(public_key) = identity.get_public_key_by_id(public_key_id) else {
            return Ok(ConsensusError::MissingPublicKey { public_key_id }.into());
        };

        match transition.verify_signature(public_key) {
            Ok(true) => {
                debug!(%identity_id, public_key_id, "[dpp] state transition signature verified");
                Ok(ValidationResult::new())
            }
            Ok(false) => Ok(ConsensusError::InvalidStateTransitionSignature.into()),
            Err(error) => {
                warn!(%identity_id, %error, "[dpp] signature verification failed");
                Ok(ConsensusError::InvalidStateTransitionSignature.into())
            }
        }
    }
}
