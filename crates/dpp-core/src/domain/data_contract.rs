//! # Data Contract
//!
//! Identity-owned registry of document-type schemas plus shared definitions.
//!
//! ## Invariants
//!
//! - `id = sha256d(ownerId ‖ entropy)`, computed once at construction and
//!   never recomputed.
//! - Entropy is creation-time only; it is not part of `to_object()`.
//! - The encoded-properties cache is written at most once per type and is
//!   invalidated when that type's schema is replaced.

use super::encoded_properties::{flatten_encoded_properties, EncodedProperties};
use super::entropy;
use super::identifiers::generate_data_contract_id;
use super::integral;
use super::schemas::DATA_CONTRACT_META_SCHEMA_URI;
use crate::errors::DppError;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use shared_crypto::{sha256d, Hash};
use shared_types::{codec, Identifier};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Scheme of the id under which a contract is registered as a JSON schema.
pub const JSON_SCHEMA_ID_SCHEME: &str = "contract://";

/// A data contract.
#[derive(Debug)]
pub struct DataContract {
    protocol_version: u32,
    id: Identifier,
    schema: String,
    owner_id: Identifier,
    documents: Map<String, Value>,
    definitions: Map<String, Value>,
    entropy: Option<String>,
    encoded_properties: RwLock<HashMap<String, Arc<EncodedProperties>>>,
}

impl DataContract {
    /// Builds a fresh contract whose id is derived from `owner_id` and
    /// `entropy`.
    pub fn new(
        protocol_version: u32,
        owner_id: Identifier,
        documents: Map<String, Value>,
        entropy: String,
    ) -> Result<Self, DppError> {
        let entropy_bytes = entropy::decode(&entropy)
            .ok_or_else(|| DppError::MalformedObject(format!("invalid entropy `{entropy}`")))?;
        let id = generate_data_contract_id(&owner_id, &entropy_bytes);

        Ok(Self {
            protocol_version,
            id,
            schema: DATA_CONTRACT_META_SCHEMA_URI.to_string(),
            owner_id,
            documents,
            definitions: Map::new(),
            entropy: Some(entropy),
            encoded_properties: RwLock::new(HashMap::new()),
        })
    }

    /// Reconstructs a contract from its object form. Performs no validation.
    pub fn from_object(raw: &Value) -> Result<Self, DppError> {
        let object = raw
            .as_object()
            .ok_or_else(|| DppError::MalformedObject("data contract is not an object".into()))?;

        let protocol_version = object
            .get("protocolVersion")
            .and_then(integral::as_u32)
            .ok_or_else(|| DppError::MalformedObject("invalid protocolVersion".into()))?;

        let id = Identifier::from_value(field(object, "$id")?)?;
        let owner_id = Identifier::from_value(field(object, "ownerId")?)?;

        let schema = field(object, "$schema")?
            .as_str()
            .ok_or_else(|| DppError::MalformedObject("$schema is not a string".into()))?
            .to_string();

        let documents = field(object, "documents")?
            .as_object()
            .cloned()
            .ok_or_else(|| DppError::MalformedObject("documents is not an object".into()))?;

        let definitions = match object.get("definitions") {
            None => Map::new(),
            Some(Value::Object(definitions)) => definitions.clone(),
            Some(_) => {
                return Err(DppError::MalformedObject(
                    "definitions is not an object".into(),
                ))
            }
        };

        Ok(Self {
            protocol_version,
            id,
            schema,
            owner_id,
            documents,
            definitions,
            entropy: None,
            encoded_properties: RwLock::new(HashMap::new()),
        })
    }

    /// Object form. `definitions` is omitted when empty.
    pub fn to_object(&self) -> Value {
        let mut object = Map::new();
        object.insert("protocolVersion".into(), json!(self.protocol_version));
        object.insert("$id".into(), self.id.to_value());
        object.insert("$schema".into(), json!(self.schema));
        object.insert("ownerId".into(), self.owner_id.to_value());
        object.insert("documents".into(), Value::Object(self.documents.clone()));
        if !self.definitions.is_empty() {
            object.insert(
                "definitions".into(),
                Value::Object(self.definitions.clone()),
            );
        }
        Value::Object(object)
    }

    /// Canonical bytes.
    pub fn to_buffer(&self) -> Result<Vec<u8>, DppError> {
        Ok(codec::encode(&self.to_object())?)
    }

    /// Double SHA-256 of the canonical bytes.
    pub fn hash(&self) -> Result<Hash, DppError> {
        Ok(sha256d(&self.to_buffer()?))
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Protocol version the contract was created under.
    pub fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    /// Contract id.
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// Owning identity.
    pub fn owner_id(&self) -> Identifier {
        self.owner_id
    }

    /// Declared meta-schema URI.
    pub fn json_meta_schema(&self) -> &str {
        &self.schema
    }

    /// Document schemas by type.
    pub fn documents(&self) -> &Map<String, Value> {
        &self.documents
    }

    /// Shared sub-schemas.
    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    /// Creation entropy, present only on freshly created contracts.
    pub fn entropy(&self) -> Option<&str> {
        self.entropy.as_deref()
    }

    /// Id under which the contract is handed to the schema validator.
    pub fn json_schema_id(&self) -> String {
        format!("{JSON_SCHEMA_ID_SCHEME}{}", self.id.to_hex())
    }

    /// `{json_schema_id: to_object()}` for the schema validator.
    pub fn additional_schemas(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([(self.json_schema_id(), self.to_object())])
    }

    // =========================================================================
    // PRE-REGISTRATION MUTATION
    // =========================================================================

    /// Replaces one document schema and drops its cached encoded properties.
    pub fn set_document_schema(&mut self, document_type: &str, schema: Value) {
        self.documents.insert(document_type.to_string(), schema);
        self.encoded_properties.write().remove(document_type);
    }

    /// Replaces every document schema.
    pub fn set_documents(&mut self, documents: Map<String, Value>) {
        self.documents = documents;
        self.encoded_properties.write().clear();
    }

    /// Replaces the shared definitions.
    pub fn set_definitions(&mut self, definitions: Map<String, Value>) {
        self.definitions = definitions;
    }

    /// Sets or clears the creation entropy.
    pub fn set_entropy(&mut self, entropy: Option<String>) {
        self.entropy = entropy;
    }

    // =========================================================================
    // DOCUMENT TYPES
    // =========================================================================

    /// `true` if `document_type` has a schema.
    pub fn is_document_defined(&self, document_type: &str) -> bool {
        self.documents.contains_key(document_type)
    }

    /// Schema of `document_type`.
    pub fn get_document_schema(&self, document_type: &str) -> Result<&Value, DppError> {
        self.documents
            .get(document_type)
            .ok_or_else(|| DppError::InvalidDocumentType {
                document_type: document_type.to_string(),
                data_contract_id: self.id,
            })
    }

    /// `$ref` pointer to `document_type` resolvable against
    /// [`additional_schemas`](Self::additional_schemas).
    pub fn get_document_schema_ref(&self, document_type: &str) -> Result<Value, DppError> {
        self.get_document_schema(document_type)?;
        Ok(json!({
            "$ref": format!("{}#/documents/{document_type}", self.json_schema_id())
        }))
    }

    /// Declared indices of `document_type`, empty when none.
    pub fn indices(&self, document_type: &str) -> &[Value] {
        self.documents
            .get(document_type)
            .and_then(|schema| schema.get("indices"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indices of `document_type` declared `unique: true`.
    pub fn unique_indices(&self, document_type: &str) -> Vec<&Value> {
        self.indices(document_type)
            .iter()
            .filter(|index| index.get("unique").and_then(Value::as_bool) == Some(true))
            .collect()
    }

    /// Flattened `contentEncoding` map of `document_type`, computed once.
    pub fn get_encoded_properties(
        &self,
        document_type: &str,
    ) -> Result<Arc<EncodedProperties>, DppError> {
        if let Some(cached) = self.encoded_properties.read().get(document_type) {
            return Ok(Arc::clone(cached));
        }

        let schema = self.get_document_schema(document_type)?;
        let mut cache = self.encoded_properties.write();
        let entry = cache
            .entry(document_type.to_string())
            .or_insert_with(|| Arc::new(flatten_encoded_properties(schema)));
        Ok(Arc::clone(entry))
    }
}

fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a Value, DppError> {
    object
        .get(name)
        .ok_or_else(|| DppError::MalformedObject(format!("missing `{name}`")))
}

impl Clone for DataContract {
    fn clone(&self) -> Self {
        Self {
            protocol_version: self.protocol_version,
            id: self.id,
            schema: self.schema.clone(),
            owner_id: self.owner_id,
            documents: self.documents.clone(),
            definitions: self.definitions.clone(),
            entropy: self.entropy.clone(),
            encoded_properties: RwLock::new(HashMap::new()),
        }
    }
}

impl PartialEq for DataContract {
    fn eq(&self, other: &Self) -> bool {
        self.protocol_version == other.protocol_version
            && self.id == other.id
            && self.schema == other.schema
            && self.owner_id == other.owner_id
            && self.documents == other.documents
            && self.definitions == other.definitions
    }
}
