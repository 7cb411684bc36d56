//! # Data Contract Validator
//!
//! Stages run in a fixed order and the first failing stage ends validation:
//!
//! 1. Canonical size (`DataContractMaxByteSizeExceeded` at 15 KiB or more)
//! 2. Meta-schema
//! 3. Dereferenced depth
//! 4. Owner allow-list, when configured
//! 5. Index rules, per document type and index
//!
//! Index rules accumulate: every violation of every index is reported.

use super::max_depth::validate_data_contract_max_depth;
use crate::config::PlatformConfig;
use crate::domain::limits::{DATA_CONTRACT_MAX_BYTES, UNIQUE_INDEX_LIMIT};
use crate::domain::schemas::DATA_CONTRACT_META_SCHEMA;
use crate::domain::validation_result::ValidationResult;
use crate::errors::ConsensusError;
use crate::ports::outbound::JsonSchemaValidator;
use serde_json::{Map, Value};
use shared_types::{codec, Identifier};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Property that every document type is already indexed by.
const PREBUILT_INDEX_PROPERTY: &str = "$id";

/// Validates raw data contracts.
pub struct DataContractValidator<V: JsonSchemaValidator> {
    json_schema_validator: Arc<V>,
    config: PlatformConfig,
}

impl<V: JsonSchemaValidator> DataContractValidator<V> {
    /// Creates a validator. The allow-list is taken from `config`.
    pub fn new(json_schema_validator: Arc<V>, config: PlatformConfig) -> Self {
        Self {
            json_schema_validator,
            config,
        }
    }

    /// Runs every stage against `raw_data_contract`.
    pub fn validate(&self, raw_data_contract: &Value) -> ValidationResult {
        match codec::encode_unbounded(raw_data_contract) {
            Ok(bytes) if bytes.len() >= DATA_CONTRACT_MAX_BYTES => {
                return ConsensusError::DataContractMaxByteSizeExceeded {
                    size: bytes.len(),
                    max_size: DATA_CONTRACT_MAX_BYTES,
                }
                .into();
            }
            Ok(_) => {}
            Err(error) => {
                return ConsensusError::SerializedObjectParsing {
                    message: error.to_string(),
                }
                .into();
            }
        }

        let result = self.json_schema_validator.validate(
            &DATA_CONTRACT_META_SCHEMA,
            raw_data_contract,
            &BTreeMap::new(),
        );
        if !result.is_valid() {
            return result;
        }

        let result = validate_data_contract_max_depth(raw_data_contract);
        if !result.is_valid() {
            return result;
        }

        if let Some(owner_id) = raw_data_contract
            .get("ownerId")
            .and_then(|value| Identifier::from_value(value).ok())
        {
            if !self.config.is_owner_allowed(&owner_id) {
                return ConsensusError::DataContractRestrictedIdentity { owner_id }.into();
            }
        }

        let result = validate_indices(raw_data_contract);
        debug!(
            valid = result.is_valid(),
            errors = result.errors().len(),
            "[dpp] data contract validated"
        );
        result
    }
}

/// Index rules for every document type of a meta-schema-valid contract.
pub fn validate_indices(raw_data_contract: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();
    let Some(documents) = raw_data_contract.get("documents").and_then(Value::as_object) else {
        return result;
    };

    for (document_type, document_schema) in documents {
        let Some(indices) = document_schema.get("indices").and_then(Value::as_array) else {
            continue;
        };

        let mut unique_count = 0;
        let mut fingerprints = HashSet::new();

        for index in indices {
            if index.get("unique").and_then(Value::as_bool) == Some(true) {
                unique_count += 1;
                if unique_count == UNIQUE_INDEX_LIMIT + 1 {
                    result.add_error(ConsensusError::UniqueIndicesLimitReached {
                        document_type: document_type.clone(),
                        limit: UNIQUE_INDEX_LIMIT,
                    });
                }
            }

            let properties = index
                .get("properties")
                .cloned()
                .unwrap_or(Value::Array(Vec::new()));
            let names = index_property_names(&properties);

            if names.len() == 1 && names[0] == PREBUILT_INDEX_PROPERTY {
                result.add_error(ConsensusError::SystemPropertyIndexAlreadyPresent {
                    document_type: document_type.clone(),
                    index_definition: index.clone(),
                    property_name: PREBUILT_INDEX_PROPERTY.to_string(),
                });
            }

            let user_names: Vec<&str> = names
                .iter()
                .copied()
                .filter(|name| !name.starts_with('$'))
                .collect();

            let mut undefined = Vec::new();
            for name in &user_names {
                match resolve_property_schema(raw_data_contract, document_schema, name) {
                    None => undefined.push(*name),
                    Some(property_schema) => {
                        if let Some(property_type) =
                            non_indexable_type(raw_data_contract, property_schema)
                        {
                            result.add_error(ConsensusError::InvalidIndexPropertyType {
                                document_type: document_type.clone(),
                                index_definition: index.clone(),
                                property_name: name.to_string(),
                                property_type: property_type.to_string(),
                            });
                        }
                    }
                }
            }

            if !fingerprints.insert(properties.to_string()) {
                result.add_error(ConsensusError::DuplicateIndex {
                    document_type: document_type.clone(),
                    index_definition: index.clone(),
                });
            }

            for name in undefined {
                result.add_error(ConsensusError::UndefinedIndexProperty {
                    document_type: document_type.clone(),
                    index_definition: index.clone(),
                    property_name: name.to_string(),
                });
            }
        }
    }

    result
}

fn index_property_names(properties: &Value) -> Vec<&str> {
    properties
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|property| property.as_object()?.keys().next())
        .map(String::as_str)
        .collect()
}

/// Follows a local `#/...` reference inside the raw contract.
fn dereference<'a>(raw_data_contract: &'a Value, schema: &'a Value) -> &'a Value {
    let mut current = schema;
    // Bounded so a reference cycle cannot spin forever.
    for _ in 0..32 {
        let Some(pointer) = current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| reference.strip_prefix('#'))
        else {
            break;
        };
        match raw_data_contract.pointer(pointer) {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}

/// Schema of the dotted property `path` inside `document_schema`.
fn resolve_property_schema<'a>(
    raw_data_contract: &'a Value,
    document_schema: &'a Value,
    path: &str,
) -> Option<&'a Value> {
    let mut current = dereference(raw_data_contract, document_schema);
    for segment in path.split('.') {
        let properties: &Map<String, Value> = current.get("properties")?.as_object()?;
        current = dereference(raw_data_contract, properties.get(segment)?);
    }
    Some(current)
}

/// `Some(type)` when the property cannot be indexed.
fn non_indexable_type(raw_data_contract: &Value, property_schema: &Value) -> Option<&'static str> {
    match property_schema.get("type").and_then(Value::as_str) {
        Some("object") => Some("object"),
        Some("array") => {
            let items = property_schema.get("items")?;
            if items.is_array() {
                return Some("array");
            }
            match dereference(raw_data_contract, items)
                .get("type")
                .and_then(Value::as_str)
            {
                Some("object" | "array") => Some("array"),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json_schema::DraftSchemaValidator;
    use crate::domain::schemas::DATA_CONTRACT_META_SCHEMA_URI;
    use serde_json::json;

    const OWNER: Identifier = Identifier::new([4u8; 32]);

    fn validator(config: PlatformConfig) -> DataContractValidator<DraftSchemaValidator> {
        DataContractValidator::new(Arc::new(DraftSchemaValidator::new()), config)
    }

    fn raw_contract(documents: Value) -> Value {
        json!({
            "protocolVersion": 0,
            "$schema": DATA_CONTRACT_META_SCHEMA_URI,
            "$id": Identifier::new([5u8; 32]).to_hex(),
            "ownerId": OWNER.to_hex(),
            "documents": documents
        })
    }

    fn note_with_indices(indices: Value) -> Value {
        raw_contract(json!({
            "note": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "meta": {
                        "type": "object",
                        "properties": { "lang": { "type": "string" } },
                        "additionalProperties": false
                    },
                    "pairs": { "type": "array", "items": [{ "type": "string" }] },
                    "nested": { "type": "array", "items": { "type": "object" } }
                },
                "indices": indices,
                "additionalProperties": false
            }
        }))
    }

    #[test]
    fn test_valid_contract() {
        let raw = note_with_indices(json!([
            { "properties": [{ "$ownerId": "asc" }, { "title": "asc" }], "unique": true },
            { "properties": [{ "meta.lang": "asc" }] },
            { "properties": [{ "tags": "desc" }] }
        ]));

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn test_meta_schema_failure_short_circuits() {
        let mut raw = note_with_indices(json!([{ "properties": [{ "meta": "asc" }] }]));
        raw["documents"]["note"]
            .as_object_mut()
            .unwrap()
            .remove("additionalProperties");

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert!(!result.is_valid());
        assert!(result
            .errors()
            .iter()
            .all(|error| matches!(error, ConsensusError::JsonSchema(_))));
    }

    #[test]
    fn test_size_limit() {
        let properties: Map<String, Value> = (0..100)
            .map(|i| {
                (
                    format!("property{i:03}"),
                    json!({ "type": "string", "description": "x".repeat(200) }),
                )
            })
            .collect();
        let raw = raw_contract(json!({
            "note": { "type": "object", "properties": properties, "additionalProperties": false }
        }));

        assert!(matches!(
            validator(PlatformConfig::default()).validate(&raw).first_error(),
            Some(ConsensusError::DataContractMaxByteSizeExceeded { max_size: DATA_CONTRACT_MAX_BYTES, .. })
        ));
    }

    #[test]
    fn test_allow_list() {
        let raw = note_with_indices(json!([{ "properties": [{ "title": "asc" }] }]));
        let restricted = PlatformConfig {
            allowed_contract_owners: vec![Identifier::new([9u8; 32])],
            ..PlatformConfig::default()
        };
        let permitted = PlatformConfig {
            allowed_contract_owners: vec![OWNER],
            ..PlatformConfig::default()
        };

        assert_eq!(
            validator(restricted).validate(&raw).first_error(),
            Some(&ConsensusError::DataContractRestrictedIdentity { owner_id: OWNER })
        );
        assert!(validator(permitted).validate(&raw).is_valid());
    }

    #[test]
    fn test_non_indexable_types() {
        let raw = note_with_indices(json!([
            { "properties": [{ "meta": "asc" }] },
            { "properties": [{ "pairs": "asc" }] },
            { "properties": [{ "nested": "asc" }] }
        ]));

        let types: Vec<String> = validator(PlatformConfig::default())
            .validate(&raw)
            .into_errors()
            .into_iter()
            .filter_map(|error| match error {
                ConsensusError::InvalidIndexPropertyType { property_type, .. } => {
                    Some(property_type)
                }
                _ => None,
            })
            .collect();
        assert_eq!(types, vec!["object", "array", "array"]);
    }

    #[test]
    fn test_duplicate_index() {
        let raw = note_with_indices(json!([
            { "properties": [{ "title": "asc" }] },
            { "properties": [{ "title": "asc" }], "unique": true }
        ]));

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert_eq!(result.errors().len(), 1);
        assert!(matches!(
            result.first_error(),
            Some(ConsensusError::DuplicateIndex { document_type, .. }) if document_type == "note"
        ));
    }

    #[test]
    fn test_undefined_property_and_prebuilt_index() {
        let raw = note_with_indices(json!([
            { "properties": [{ "$id": "asc" }] },
            { "properties": [{ "missing": "asc" }, { "$createdAt": "asc" }] }
        ]));

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert!(matches!(
            result.errors(),
            [
                ConsensusError::SystemPropertyIndexAlreadyPresent { .. },
                ConsensusError::UndefinedIndexProperty { property_name, .. },
            ] if property_name == "missing"
        ));
    }

    #[test]
    fn test_unique_limit_reported_once() {
        let raw = note_with_indices(json!([
            { "properties": [{ "title": "asc" }], "unique": true },
            { "properties": [{ "tags": "asc" }], "unique": true },
            { "properties": [{ "meta.lang": "asc" }], "unique": true },
            { "properties": [{ "$ownerId": "asc" }], "unique": true },
            { "properties": [{ "$createdAt": "asc" }], "unique": true }
        ]));

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert_eq!(
            result.errors(),
            &[ConsensusError::UniqueIndicesLimitReached {
                document_type: "note".into(),
                limit: UNIQUE_INDEX_LIMIT,
            }]
        );
    }

    #[test]
    fn test_index_property_through_definition_ref() {
        let mut raw = note_with_indices(json!([{ "properties": [{ "address.city": "asc" }] }]));
        raw["definitions"] = json!({
            "address": {
                "type": "object",
                "properties": { "city": { "type": "string" } },
                "additionalProperties": false
            }
        });
        raw["documents"]["note"]["properties"]["address"] = json!({ "$ref": "#/definitions/address" });

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert!(result.is_valid(), "{:?}", result.errors());
    }
}
