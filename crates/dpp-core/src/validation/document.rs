//! Document validator.
//!
//! Checks a document in text form against its type's schema enriched with
//! the stored-document system properties.

use crate::domain::data_contract::DataContract;
use crate::domain::enrichment::enrich_data_contract_with_base_schema;
use crate::domain::schemas::DOCUMENT_BASE_SCHEMA;
use crate::domain::validation_result::ValidationResult;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::JsonSchemaValidator;
use serde_json::Value;
use std::sync::Arc;

/// Validates raw documents against their data contract.
pub struct DocumentValidator<V: JsonSchemaValidator> {
    json_schema_validator: Arc<V>,
}

impl<V: JsonSchemaValidator> DocumentValidator<V> {
    /// Creates a validator.
    pub fn new(json_schema_validator: Arc<V>) -> Self {
        Self {
            json_schema_validator,
        }
    }

    /// Validates `raw_document` (text form) against `data_contract`.
    pub fn validate(
        &self,
        raw_document: &Value,
        data_contract: &DataContract,
    ) -> Result<ValidationResult, DppError> {
        let Some(type_value) = raw_document.get("$type") else {
            return Ok(ConsensusError::MissingDocumentType.into());
        };
        let document_type = type_value.as_str().unwrap_or_default();
        if !data_contract.is_document_defined(document_type) {
            return Ok(ConsensusError::InvalidDocumentType {
                document_type: document_type.to_string(),
                data_contract_id: data_contract.id(),
            }
            .into());
        }

        let enriched =
            enrich_data_contract_with_base_schema(data_contract, &[&*DOCUMENT_BASE_SCHEMA], &[]);
        let schema_ref = enriched.get_document_schema_ref(document_type)?;

        Ok(self.json_schema_validator.validate(
            &schema_ref,
            raw_document,
            &enriched.additional_schemas(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json_schema::DraftSchemaValidator;
    use crate::domain::document::Document;
    use crate::domain::entropy;
    use serde_json::json;
    use shared_types::Identifier;

    fn contract() -> DataContract {
        let documents = json!({
            "note": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "maxLength": 10 },
                    "cover": { "type": "string", "contentEncoding": "hex" }
                },
                "required": ["title"],
                "additionalProperties": false
            }
        });
        DataContract::new(
            0,
            Identifier::new([1u8; 32]),
            documents.as_object().cloned().unwrap(),
            entropy::generate(),
        )
        .unwrap()
    }

    fn validator() -> DocumentValidator<DraftSchemaValidator> {
        DocumentValidator::new(Arc::new(DraftSchemaValidator::new()))
    }

    fn raw_document(contract: &DataContract, data: Value) -> Value {
        let document = Document::new(
            Identifier::new([2u8; 32]),
            "note",
            contract.id(),
            contract.owner_id(),
            1,
            None,
            None,
            data.as_object().cloned().unwrap(),
        );
        document.to_json(contract).unwrap()
    }

    #[test]
    fn test_valid_document() {
        let contract = contract();
        let raw = raw_document(&contract, json!({ "title": "hi", "cover": [1, 2] }));

        let result = validator().validate(&raw, &contract).unwrap();
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn test_type_checks() {
        let contract = contract();

        assert_eq!(
            validator().validate(&json!({}), &contract).unwrap().errors(),
            &[ConsensusError::MissingDocumentType]
        );
        assert!(matches!(
            validator()
                .validate(&json!({ "$type": "tag" }), &contract)
                .unwrap()
                .first_error(),
            Some(ConsensusError::InvalidDocumentType { .. })
        ));
    }

    #[test]
    fn test_user_and_system_properties_checked_together() {
        let contract = contract();
        let mut raw = raw_document(&contract, json!({ "title": "far too long a title" }));
        raw["$revision"] = json!(0);

        let keywords: Vec<String> = validator()
            .validate(&raw, &contract)
            .unwrap()
            .into_errors()
            .into_iter()
            .filter_map(|error| match error {
                ConsensusError::JsonSchema(error) => Some(error.keyword),
                _ => None,
            })
            .collect();
        assert_eq!(keywords, vec!["minimum", "maxLength"]);
    }
}
