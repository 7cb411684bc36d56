//! State transition factory: wire forms to parsed transitions, running
//! structure validation unless skipped.

use crate::config::PlatformConfig;
use crate::domain::state_transition::StateTransition;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::{JsonSchemaValidator, StateRepository};
use crate::validation::state_transition::StateTransitionValidator;
use serde_json::Value;
use shared_types::{codec, MAX_ENCODED_BYTES};
use std::sync::Arc;

/// Factory for state transitions of every kind.
pub struct StateTransitionFactory<V: JsonSchemaValidator, R: StateRepository> {
    validator: StateTransitionValidator<V, R>,
}

impl<V: JsonSchemaValidator, R: StateRepository> StateTransitionFactory<V, R> {
    /// Creates a factory.
    pub fn new(json_schema_validator: Arc<V>, state_repository: Arc<R>, config: PlatformConfig) -> Self {
        Self {
            validator: StateTransitionValidator::new(json_schema_validator, state_repository, config),
        }
    }

    /// Parses the object form.
    pub async fn create_from_object(
        &self,
        raw_transition: &Value,
        skip_validation: bool,
    ) -> Result<StateTransition, DppError> {
        if !skip_validation {
            let result = self.validator.validate_structure(raw_transition).await?;
            if !result.is_valid() {
                return Err(DppError::InvalidStateTransition {
                    errors: result.into_errors(),
                    raw: raw_transition.clone(),
                });
            }
        }
        StateTransition::from_object(raw_transition)
    }

    /// Parses canonical bytes.
    pub async fn create_from_buffer(
        &self,
        bytes: &[u8],
        skip_validation: bool,
    ) -> Result<StateTransition, DppError> {
        let invalid = |error: ConsensusError| DppError::InvalidStateTransition {
            errors: vec![error],
            raw: Value::Null,
        };

        if bytes.len() > MAX_ENCODED_BYTES {
            return Err(invalid(ConsensusError::StateTransitionMaxSizeExceeded {
                size: bytes.len(),
                max_size: MAX_ENCODED_BYTES,
            }));
        }
        let raw_transition = codec::decode(bytes).map_err(|error| {
            invalid(ConsensusError::SerializedObjectParsing {
                message: error.to_string(),
            })
        })?;

        self.create_from_object(&raw_transition, skip_validation).await
    }
}
