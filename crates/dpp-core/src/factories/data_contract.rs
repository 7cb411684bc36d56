//! # Data Contract Factory
//!
//! Builds fresh contracts and reconstructs stored ones, validating unless
//! asked not to. Every validation failure surfaces as one
//! `DppError::InvalidDataContract` carrying the full error list.

use crate::config::PlatformConfig;
use crate::domain::data_contract::DataContract;
use crate::domain::data_contract_create_transition::DataContractCreateTransition;
use crate::domain::entropy;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::JsonSchemaValidator;
use crate::validation::data_contract::DataContractValidator;
use serde_json::{Map, Value};
use shared_types::{codec, Identifier};
use std::sync::Arc;
use tracing::debug;

/// Factory for data contracts.
pub struct DataContractFactory<V: JsonSchemaValidator> {
    protocol_version: u32,
    validator: DataContractValidator<V>,
}

impl<V: JsonSchemaValidator> DataContractFactory<V> {
    /// Creates a factory stamping `config.protocol_version`.
    pub fn new(json_schema_validator: Arc<V>, config: PlatformConfig) -> Self {
        Self {
            protocol_version: config.protocol_version,
            validator: DataContractValidator::new(json_schema_validator, config),
        }
    }

    /// Fresh contract with generated entropy and no definitions. Performs
    /// no validation.
    pub fn create(
        &self,
        owner_id: Identifier,
        documents: Map<String, Value>,
    ) -> Result<DataContract, DppError> {
        let data_contract =
            DataContract::new(self.protocol_version, owner_id, documents, entropy::generate())?;
        debug!(data_contract_id = %data_contract.id(), "[dpp] data contract created");
        Ok(data_contract)
    }

    /// Reconstructs a contract from its object form.
    pub fn create_from_object(
        &self,
        raw_data_contract: &Value,
        skip_validation: bool,
    ) -> Result<DataContract, DppError> {
        if !skip_validation {
            let result = self.validator.validate(raw_data_contract);
            if !result.is_valid() {
                return Err(DppError::InvalidDataContract {
                    errors: result.into_errors(),
                    raw: raw_data_contract.clone(),
                });
            }
        }
        DataContract::from_object(raw_data_contract)
    }

    /// Reconstructs a contract from canonical bytes.
    pub fn create_from_buffer(
        &self,
        bytes: &[u8],
        skip_validation: bool,
    ) -> Result<DataContract, DppError> {
        let raw_data_contract = codec::decode(bytes).map_err(|error| DppError::InvalidDataContract {
            errors: vec![ConsensusError::SerializedObjectParsing {
                message: error.to_string(),
            }],
            raw: Value::Null,
        })?;
        self.create_from_object(&raw_data_contract, skip_validation)
    }

    /// Unsigned create transition registering `data_contract`, which must
    /// still carry its creation entropy.
    pub fn create_data_contract_create_transition(
        &self,
        data_contract: DataContract,
    ) -> Result<DataContractCreateTransition, DppError> {
        DataContractCreateTransition::new(self.protocol_version, data_contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json_schema::DraftSchemaValidator;
    use crate::domain::identifiers::generate_data_contract_id;
    use serde_json::json;

    const OWNER: Identifier = Identifier::new([2u8; 32]);

    fn factory() -> DataContractFactory<DraftSchemaValidator> {
        DataContractFactory::new(Arc::new(DraftSchemaValidator::new()), PlatformConfig::default())
    }

    fn documents() -> Map<String, Value> {
        json!({
            "note": {
                "type": "object",
                "properties": { "title": { "type": "string" } },
                "additionalProperties": false
            }
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_create_derives_id_from_entropy() {
        let data_contract = factory().create(OWNER, documents()).unwrap();
        let entropy_bytes = entropy::decode(data_contract.entropy().unwrap()).unwrap();

        assert_eq!(
            data_contract.id(),
            generate_data_contract_id(&OWNER, &entropy_bytes)
        );
        assert!(data_contract.definitions().is_empty());
    }

    #[test]
    fn test_object_and_buffer_roundtrip() {
        let factory = factory();
        let data_contract = factory.create(OWNER, documents()).unwrap();

        let from_object = factory
            .create_from_object(&data_contract.to_object(), false)
            .unwrap();
        let from_buffer = factory
            .create_from_buffer(&data_contract.to_buffer().unwrap(), false)
            .unwrap();

        assert_eq!(from_object, data_contract);
        assert_eq!(from_buffer, data_contract);
    }

    #[test]
    fn test_invalid_object_aggregates_errors() {
        let factory = factory();
        let mut raw = factory.create(OWNER, documents()).unwrap().to_object();
        raw["documents"]["note"]["indices"] = json!([
            { "properties": [{ "missing": "asc" }] },
            { "properties": [{ "missing": "asc" }] }
        ]);

        let error = factory.create_from_object(&raw, false).unwrap_err();
        assert!(matches!(error, DppError::InvalidDataContract { .. }));
        assert_eq!(error.consensus_errors().len(), 3);

        assert!(factory.create_from_object(&raw, true).is_ok());
    }

    #[test]
    fn test_garbage_buffer() {
        let error = factory().create_from_buffer(&[0xff, 0x00], false).unwrap_err();

        assert!(matches!(
            error.consensus_errors(),
            [ConsensusError::SerializedObjectParsing { .. }]
        ));
    }

    #[test]
    fn test_create_transition_requires_entropy() {
        let factory = factory();
        let data_contract = factory.create(OWNER, documents()).unwrap();
        let restored = DataContract::from_object(&data_contract.to_object()).unwrap();

        assert!(factory
            .create_data_contract_create_transition(data_contract)
            .is_ok());
        assert_eq!(
            factory.create_data_contract_create_transition(restored),
            Err(DppError::MissingEntropy)
        );
    }
}
