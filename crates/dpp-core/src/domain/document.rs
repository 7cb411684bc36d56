//! # Document
//!
//! Schema-validated record of one document type, owned by an identity and
//! tracked by revision. User data is held in native form (binary properties
//! as byte arrays); `to_json` produces the text form.

use super::data_contract::DataContract;
use super::encoded_properties::{to_native_form, to_text_form};
use super::integral;
use super::property_path;
use crate::errors::DppError;
use serde_json::{json, Map, Value};
use shared_crypto::{sha256d, Hash};
use shared_types::{codec, Identifier};

/// A document.
///
/// Equality is by `$id`: two documents with the same id are the same
/// document, whatever their revision.
#[derive(Debug, Clone)]
pub struct Document {
    id: Identifier,
    document_type: String,
    data_contract_id: Identifier,
    owner_id: Identifier,
    revision: u64,
    created_at: Option<u64>,
    updated_at: Option<u64>,
    data: Map<String, Value>,
    entropy: Option<String>,
}

impl Document {
    /// Assembles a document from its parts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Identifier,
        document_type: impl Into<String>,
        data_contract_id: Identifier,
        owner_id: Identifier,
        revision: u64,
        created_at: Option<u64>,
        updated_at: Option<u64>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            document_type: document_type.into(),
            data_contract_id,
            owner_id,
            revision,
            created_at,
            updated_at,
            data,
            entropy: None,
        }
    }

    /// Parses the native object form. Non-system keys become user data.
    pub fn from_object(raw: &Value) -> Result<Self, DppError> {
        let object = raw
            .as_object()
            .ok_or_else(|| DppError::MalformedObject("document is not an object".into()))?;

        let required = |name: &str| {
            object
                .get(name)
                .ok_or_else(|| DppError::MalformedObject(format!("missing `{name}`")))
        };
        let timestamp = |name: &str| -> Result<Option<u64>, DppError> {
            match object.get(name) {
                None => Ok(None),
                Some(value) => integral::as_u64(value)
                    .map(Some)
                    .ok_or_else(|| DppError::MalformedObject(format!("invalid `{name}`"))),
            }
        };

        let document_type = required("$type")?
            .as_str()
            .ok_or_else(|| DppError::MalformedObject("`$type` is not a string".into()))?
            .to_string();
        let revision = integral::as_u64(required("$revision")?)
            .ok_or_else(|| DppError::MalformedObject("invalid `$revision`".into()))?;

        Ok(Self {
            id: Identifier::from_value(required("$id")?)?,
            document_type,
            data_contract_id: Identifier::from_value(required("$dataContractId")?)?,
            owner_id: Identifier::from_value(required("$ownerId")?)?,
            revision,
            created_at: timestamp("$createdAt")?,
            updated_at: timestamp("$updatedAt")?,
            data: user_data(object),
            entropy: None,
        })
    }

    /// Parses the text form, decoding binary properties declared by
    /// `contract`.
    pub fn from_json(raw: &Value, contract: &DataContract) -> Result<Self, DppError> {
        let mut document = Self::from_object(raw)?;
        let encoded = contract.get_encoded_properties(&document.document_type)?;
        to_native_form(&mut document.data, &encoded)?;
        Ok(document)
    }

    /// Native object form: system properties followed by user data.
    pub fn to_object(&self) -> Value {
        let mut object = Map::new();
        object.insert("$id".into(), self.id.to_value());
        object.insert("$type".into(), json!(self.document_type));
        object.insert("$dataContractId".into(), self.data_contract_id.to_value());
        object.insert("$ownerId".into(), self.owner_id.to_value());
        object.insert("$revision".into(), json!(self.revision));
        if let Some(created_at) = self.created_at {
            object.insert("$createdAt".into(), json!(created_at));
        }
        if let Some(updated_at) = self.updated_at {
            object.insert("$updatedAt".into(), json!(updated_at));
        }
        for (key, value) in &self.data {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Text form: binary properties rendered in their `contentEncoding`.
    pub fn to_json(&self, contract: &DataContract) -> Result<Value, DppError> {
        let encoded = contract.get_encoded_properties(&self.document_type)?;
        let mut object = self.to_object();
        if let Value::Object(map) = &mut object {
            to_text_form(map, &encoded);
        }
        Ok(object)
    }

    /// Canonical bytes of the native form.
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

    /// Document id.
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// Document type name.
    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    /// Id of the data contract defining the type.
    pub fn data_contract_id(&self) -> Identifier {
        self.data_contract_id
    }

    /// Owning identity.
    pub fn owner_id(&self) -> Identifier {
        self.owner_id
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Creation timestamp in milliseconds.
    pub fn created_at(&self) -> Option<u64> {
        self.created_at
    }

    /// Last update timestamp in milliseconds.
    pub fn updated_at(&self) -> Option<u64> {
        self.updated_at
    }

    /// Creation entropy, present only on documents created locally.
    pub fn entropy(&self) -> Option<&str> {
        self.entropy.as_deref()
    }

    /// User data (no system properties).
    pub fn get_data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Reads a system property or a dotted user property path.
    pub fn get(&self, path: &str) -> Option<Value> {
        match path {
            "$id" => Some(self.id.to_value()),
            "$type" => Some(json!(self.document_type)),
            "$dataContractId" => Some(self.data_contract_id.to_value()),
            "$ownerId" => Some(self.owner_id.to_value()),
            "$revision" => Some(json!(self.revision)),
            "$createdAt" => self.created_at.map(|at| json!(at)),
            "$updatedAt" => self.updated_at.map(|at| json!(at)),
            _ => property_path::get(&self.data, path).cloned(),
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Replaces user data. System keys in `data` are ignored.
    pub fn set_data(&mut self, data: Map<String, Value>) {
        self.data = user_data(&data);
    }

    /// Writes a dotted user property path.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), DppError> {
        if path.starts_with('$') {
            return Err(DppError::MalformedObject(format!(
                "`{path}` is a system property"
            )));
        }
        property_path::set(&mut self.data, path, value)
    }

    /// Sets the revision.
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Sets the creation timestamp.
    pub fn set_created_at(&mut self, created_at: Option<u64>) {
        self.created_at = created_at;
    }

    /// Sets the update timestamp.
    pub fn set_updated_at(&mut self, updated_at: Option<u64>) {
        self.updated_at = updated_at;
    }

    /// Sets the creation entropy.
    pub fn set_entropy(&mut self, entropy: Option<String>) {
        self.entropy = entropy;
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Document {}

fn user_data(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
