//! # Protocol Schemas
//!
//! JSON schemas the protocol validates against. They are consensus data:
//! every node must hold byte-identical copies.
//!
//! | Schema | Validates |
//! |--------|-----------|
//! | `DATA_CONTRACT_META_SCHEMA` | Raw data contracts |
//! | `DOCUMENT_BASE_SCHEMA` | System properties of stored documents |
//! | `DOCUMENT_TRANSITION_BASE_SCHEMA` | System properties common to all transitions |
//! | `DOCUMENT_TRANSITION_CREATE_SCHEMA` | Create-specific system properties |
//! | `DOCUMENT_TRANSITION_REPLACE_SCHEMA` | Replace-specific system properties |
//! | `DOCUMENTS_BATCH_TRANSITION_SCHEMA` | Documents batch envelope |
//! | `DATA_CONTRACT_CREATE_TRANSITION_SCHEMA` | Data contract create envelope |

use super::limits::{ENTROPY_LENGTH, MAX_SAFE_INTEGER, MAX_TRANSITIONS_PER_BATCH};
use lazy_static::lazy_static;
use serde_json::{json, Value};

/// URI every data contract declares in `$schema`.
pub const DATA_CONTRACT_META_SCHEMA_URI: &str = "dpp://meta/data-contract";

/// Document type and user property names.
pub const NAME_PATTERN: &str = "^[a-zA-Z0-9][a-zA-Z0-9_-]{0,62}$";

/// Index property names: system properties or dotted user property paths.
pub const INDEX_PROPERTY_PATTERN: &str = r"^(\$id|\$ownerId|\$createdAt|\$updatedAt|[a-zA-Z0-9][a-zA-Z0-9_-]{0,62}(\.[a-zA-Z0-9][a-zA-Z0-9_-]{0,62})*)$";

/// Identifier text form.
pub const IDENTIFIER_PATTERN: &str = "^[0-9a-f]{64}$";

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

fn identifier() -> Value {
    json!({ "type": "string", "pattern": IDENTIFIER_PATTERN })
}

fn timestamp() -> Value {
    json!({ "type": "integer", "minimum": 0, "maximum": MAX_SAFE_INTEGER })
}

fn protocol_version() -> Value {
    json!({ "type": "integer", "minimum": 0, "maximum": u32::MAX })
}

fn signature_fields() -> (Value, Value) {
    (
        json!({ "type": "integer", "minimum": 0, "maximum": u32::MAX }),
        json!({
            "type": "string",
            "minLength": 128,
            "maxLength": 128,
            "pattern": "^[0-9a-f]+$"
        }),
    )
}

lazy_static! {
    /// Meta-schema for data contracts.
    pub static ref DATA_CONTRACT_META_SCHEMA: Value = {
        let name_map = |item_ref: &str| json!({
            "type": "object",
            "propertyNames": { "$ref": "#/definitions/name" },
            "additionalProperties": { "$ref": item_ref },
            "minProperties": 1,
            "maxProperties": 100
        });

        json!({
            "$schema": DRAFT_07,
            "$id": DATA_CONTRACT_META_SCHEMA_URI,
            "definitions": {
                "name": { "type": "string", "pattern": NAME_PATTERN },
                "identifier": identifier(),
                "propertySchema": {
                    "type": "object",
                    "properties": {
                        "$ref": { "type": "string", "pattern": "^#/definitions/" },
                        "contentEncoding": { "enum": ["base64", "hex"] },
                        "properties": name_map("#/definitions/propertySchema"),
                        "items": {
                            "anyOf": [
                                { "$ref": "#/definitions/propertySchema" },
                                {
                                    "type": "array",
                                    "minItems": 1,
                                    "items": { "$ref": "#/definitions/propertySchema" }
                                }
                            ]
                        },
                        "required": {
                            "type": "array",
                            "items": { "type": "string" },
                            "uniqueItems": true
                        }
                    }
                },
                "index": {
                    "type": "object",
                    "properties": {
                        "properties": {
                            "type": "array",
                            "minItems": 1,
                            "maxItems": 10,
                            "items": {
                                "type": "object",
                                "minProperties": 1,
                                "maxProperties": 1,
                                "propertyNames": {
                                    "type": "string",
                                    "pattern": INDEX_PROPERTY_PATTERN
                                },
                                "additionalProperties": { "enum": ["asc", "desc"] }
                            }
                        },
                        "unique": { "type": "boolean" }
                    },
                    "required": ["properties"],
                    "additionalProperties": false
                },
                "documentSchema": {
                    "type": "object",
                    "properties": {
                        "type": { "const": "object" },
                        "properties": name_map("#/definitions/propertySchema"),
                        "required": {
                            "type": "array",
                            "items": { "type": "string" },
                            "uniqueItems": true
                        },
                        "additionalProperties": { "const": false },
                        "indices": {
                            "type": "array",
                            "minItems": 1,
                            "maxItems": 10,
                            "items": { "$ref": "#/definitions/index" }
                        }
                    },
                    "required": ["type", "properties", "additionalProperties"]
                }
            },
            "type": "object",
            "properties": {
                "protocolVersion": protocol_version(),
                "$schema": { "type": "string", "const": DATA_CONTRACT_META_SCHEMA_URI },
                "$id": { "$ref": "#/definitions/identifier" },
                "ownerId": { "$ref": "#/definitions/identifier" },
                "documents": name_map("#/definitions/documentSchema"),
                "definitions": name_map("#/definitions/propertySchema")
            },
            "required": ["protocolVersion", "$schema", "$id", "ownerId", "documents"],
            "additionalProperties": false
        })
    };

    /// System properties of a stored document.
    pub static ref DOCUMENT_BASE_SCHEMA: Value = json!({
        "$schema": DRAFT_07,
        "$id": "dpp://base/document",
        "type": "object",
        "properties": {
            "$id": identifier(),
            "$type": { "type": "string" },
            "$dataContractId": identifier(),
            "$ownerId": identifier(),
            "$revision": { "type": "integer", "minimum": 1, "maximum": MAX_SAFE_INTEGER },
            "$createdAt": timestamp(),
            "$updatedAt": timestamp()
        },
        "required": ["$id", "$type", "$dataContractId", "$ownerId", "$revision"]
    });

    /// System properties shared by all document transitions. Validated alone
    /// for Delete.
    pub static ref DOCUMENT_TRANSITION_BASE_SCHEMA: Value = json!({
        "$schema": DRAFT_07,
        "$id": "dpp://document-transition/base",
        "type": "object",
        "properties": {
            "$id": identifier(),
            "$type": { "type": "string" },
            "$action": { "type": "integer", "enum": [0, 1, 3] },
            "$dataContractId": identifier()
        },
        "required": ["$id", "$type", "$action", "$dataContractId"],
        "additionalProperties": false
    });

    /// Create-specific system properties.
    pub static ref DOCUMENT_TRANSITION_CREATE_SCHEMA: Value = json!({
        "$schema": DRAFT_07,
        "$id": "dpp://document-transition/create",
        "type": "object",
        "properties": {
            "$entropy": {
                "type": "string",
                "minLength": ENTROPY_LENGTH,
                "maxLength": ENTROPY_LENGTH,
                "pattern": "^[0-9a-f]+$"
            },
            "$createdAt": timestamp(),
            "$updatedAt": timestamp()
        },
        "required": ["$entropy"]
    });

    /// Replace-specific system properties.
    pub static ref DOCUMENT_TRANSITION_REPLACE_SCHEMA: Value = json!({
        "$schema": DRAFT_07,
        "$id": "dpp://document-transition/replace",
        "type": "object",
        "properties": {
            "$revision": {
                "type": "number",
                "multipleOf": 1,
                "minimum": 1,
                "maximum": MAX_SAFE_INTEGER
            },
            "$updatedAt": timestamp()
        },
        "required": ["$revision"]
    });

    /// Documents batch envelope.
    pub static ref DOCUMENTS_BATCH_TRANSITION_SCHEMA: Value = {
        let (key_id, signature) = signature_fields();
        json!({
            "$schema": DRAFT_07,
            "$id": "dpp://state-transition/documents-batch",
            "type": "object",
            "properties": {
                "protocolVersion": protocol_version(),
                "type": { "const": 1 },
                "ownerId": identifier(),
                "transitions": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": MAX_TRANSITIONS_PER_BATCH,
                    "items": { "type": "object" }
                },
                "signaturePublicKeyId": key_id,
                "signature": signature
            },
            "required": [
                "protocolVersion",
                "type",
                "ownerId",
                "transitions",
                "signaturePublicKeyId",
                "signature"
            ],
            "additionalProperties": false
        })
    };

    /// Data contract create envelope.
    pub static ref DATA_CONTRACT_CREATE_TRANSITION_SCHEMA: Value = {
        let (key_id, signature) = signature_fields();
        json!({
            "$schema": DRAFT_07,
            "$id": "dpp://state-transition/data-contract-create",
            "type": "object",
            "properties": {
                "protocolVersion": protocol_version(),
                "type": { "const": 0 },
                "dataContract": { "type": "object" },
                "entropy": {
                    "type": "string",
                    "minLength": ENTROPY_LENGTH,
                    "maxLength": ENTROPY_LENGTH
                },
                "signaturePublicKeyId": key_id,
                "signature": signature
            },
            "required": [
                "protocolVersion",
                "type",
                "dataContract",
                "entropy",
                "signaturePublicKeyId",
                "signature"
            ],
            "additionalProperties": false
        })
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_schema_declares_uri() {
        assert_eq!(DATA_CONTRACT_META_SCHEMA["$id"], DATA_CONTRACT_META_SCHEMA_URI);
        assert!(DATA_CONTRACT_META_SCHEMA["definitions"]["documentSchema"].is_object());
    }

    #[test]
    fn test_patterns_compile_without_lookaround() {
        for pattern in [NAME_PATTERN, INDEX_PROPERTY_PATTERN, IDENTIFIER_PATTERN] {
            assert!(regex::Regex::new(pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn test_batch_schema_caps_transitions() {
        assert_eq!(
            DOCUMENTS_BATCH_TRANSITION_SCHEMA["properties"]["transitions"]["maxItems"],
            MAX_TRANSITIONS_PER_BATCH
        );
    }
}
