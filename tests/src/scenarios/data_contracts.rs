//! # Data Contract Scenarios
//!
//! Creation, canonical size limit, owner allow-list and index legality.

#[cfg(test)]
mod tests {
    use crate::init_tracing;
    use dpp_core::test_fixtures::{note_documents, platform, FIXTURE_OWNER};
    use dpp_core::{
        ConsensusError, DataContractValidator, DraftSchemaValidator, PlatformConfig,
    };
    use serde_json::{json, Value};
    use shared_types::Identifier;
    use std::sync::Arc;

    fn validator(config: PlatformConfig) -> DataContractValidator<DraftSchemaValidator> {
        DataContractValidator::new(Arc::new(DraftSchemaValidator::new()), config)
    }

    fn raw_contract(documents: Value) -> Value {
        let platform = platform(PlatformConfig::default());
        let documents = documents.as_object().cloned().unwrap();
        platform
            .data_contracts
            .create(FIXTURE_OWNER, documents)
            .unwrap()
            .to_object()
    }

    fn note_with_index(properties: Value, indices: Value) -> Value {
        json!({
            "note": {
                "type": "object",
                "properties": properties,
                "indices": indices,
                "additionalProperties": false
            }
        })
    }

    // =========================================================================
    // CREATION AND SIZE
    // =========================================================================

    #[test]
    fn test_note_contract_is_valid() {
        init_tracing();
        let raw = raw_contract(json!({
            "note": {
                "type": "object",
                "properties": { "title": { "type": "string" } },
                "additionalProperties": false
            }
        }));

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn test_contract_over_15_kib_is_rejected() {
        init_tracing();
        let raw = raw_contract(json!({
            "note": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "x".repeat(16 * 1024) }
                },
                "additionalProperties": false
            }
        }));

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert!(matches!(
            result.errors(),
            [ConsensusError::DataContractMaxByteSizeExceeded { max_size: 15360, .. }]
        ));
    }

    #[test]
    fn test_id_is_stable_across_roundtrips() -> anyhow::Result<()> {
        let platform = platform(PlatformConfig::default());
        let contract = platform.data_contracts.create(FIXTURE_OWNER, note_documents())?;

        let restored = platform
            .data_contracts
            .create_from_buffer(&contract.to_buffer()?, false)?;
        assert_eq!(restored.id(), contract.id());
        assert_eq!(restored.to_buffer()?, contract.to_buffer()?);
        assert_eq!(shared_types::decode(&contract.to_buffer()?)?, contract.to_object());
        Ok(())
    }

    #[test]
    fn test_owner_allow_list() {
        let raw = raw_contract(Value::Object(note_documents()));
        let config = PlatformConfig {
            allowed_contract_owners: vec![Identifier::new([0x22; 32])],
            ..PlatformConfig::default()
        };

        assert_eq!(
            validator(config).validate(&raw).errors(),
            &[ConsensusError::DataContractRestrictedIdentity {
                owner_id: FIXTURE_OWNER,
            }]
        );

        let config = PlatformConfig {
            allowed_contract_owners: vec![FIXTURE_OWNER],
            ..PlatformConfig::default()
        };
        assert!(validator(config).validate(&raw).is_valid());
    }

    // =========================================================================
    // INDEX LEGALITY
    // =========================================================================

    #[test]
    fn test_non_scalar_index_properties_are_rejected() {
        let cases = [
            json!({ "type": "object", "properties": { "a": { "type": "string" } } }),
            json!({ "type": "array", "items": { "type": "object" } }),
            json!({ "type": "array", "items": { "type": "array" } }),
            json!({ "type": "array", "items": [{ "type": "string" }] }),
        ];

        for property in cases {
            let raw = raw_contract(note_with_index(
                json!({ "meta": property }),
                json!([{ "properties": [{ "meta": "asc" }] }]),
            ));

            let result = validator(PlatformConfig::default()).validate(&raw);
            assert!(
                matches!(
                    result.errors(),
                    [ConsensusError::InvalidIndexPropertyType { property_name, .. }] if property_name == "meta"
                ),
                "{property}: {:?}",
                result.errors()
            );
        }
    }

    #[test]
    fn test_scalar_arrays_are_indexable() {
        let raw = raw_contract(note_with_index(
            json!({ "tags": { "type": "array", "items": { "type": "string" } } }),
            json!([{ "properties": [{ "tags": "asc" }] }]),
        ));

        assert!(validator(PlatformConfig::default()).validate(&raw).is_valid());
    }

    #[test]
    fn test_duplicate_index_definition_is_rejected() {
        let raw = raw_contract(note_with_index(
            json!({ "title": { "type": "string" } }),
            json!([
                { "properties": [{ "title": "asc" }] },
                { "properties": [{ "title": "asc" }], "unique": true }
            ]),
        ));

        assert!(matches!(
            validator(PlatformConfig::default()).validate(&raw).errors(),
            [ConsensusError::DuplicateIndex { document_type, .. }] if document_type == "note"
        ));
    }

    #[test]
    fn test_unique_index_limit_and_undefined_properties() {
        let raw = raw_contract(note_with_index(
            json!({
                "a": { "type": "string" },
                "b": { "type": "string" },
                "c": { "type": "string" },
                "d": { "type": "string" }
            }),
            json!([
                { "properties": [{ "a": "asc" }], "unique": true },
                { "properties": [{ "b": "asc" }], "unique": true },
                { "properties": [{ "c": "asc" }], "unique": true },
                { "properties": [{ "d": "asc" }], "unique": true },
                { "properties": [{ "$ownerId": "asc" }, { "missing": "asc" }] }
            ]),
        ));

        assert!(matches!(
            validator(PlatformConfig::default()).validate(&raw).errors(),
            [
                ConsensusError::UniqueIndicesLimitReached { limit: 3, .. },
                ConsensusError::UndefinedIndexProperty { property_name, .. },
            ] if property_name == "missing"
        ));
    }

    #[test]
    fn test_circular_definitions_are_rejected() {
        let mut raw = raw_contract(note_with_index(
            json!({ "loop": { "$ref": "#/definitions/a" } }),
            json!([{ "properties": [{ "$ownerId": "asc" }] }]),
        ));
        raw["definitions"] = json!({
            "a": { "type": "object", "properties": { "next": { "$ref": "#/definitions/b" } } },
            "b": { "type": "object", "properties": { "next": { "$ref": "#/definitions/a" } } }
        });

        let result = validator(PlatformConfig::default()).validate(&raw);
        assert!(matches!(
            result.errors(),
            [ConsensusError::JsonSchema(error)] if error.keyword == "$ref"
        ));
    }
}
