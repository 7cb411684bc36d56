//! # Document Transitions
//!
//! Wire-level instructions to create, replace or delete one document. Each
//! transition is tagged once with its action and keeps it for its lifetime.
//!
//! | Action | Code | Carries |
//! |--------|------|---------|
//! | Create | 0 | `$entropy`, initial data, optional timestamps |
//! | Replace | 1 | `$revision`, new data, optional `$updatedAt` |
//! | Delete | 3 | nothing beyond id and type |

use super::data_contract::DataContract;
use super::document::Document;
use super::encoded_properties::to_text_form;
use super::entropy;
use super::identifiers::generate_document_id;
use super::integral;
use super::property_path;
use crate::errors::{ApplyError, DppError};
use serde_json::{json, Map, Value};
use shared_types::Identifier;

/// Document transition action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create a new document.
    Create,
    /// Replace data of an existing document.
    Replace,
    /// Remove an existing document.
    Delete,
}

impl Action {
    /// Wire code of the action.
    pub const fn code(self) -> u64 {
        match self {
            Self::Create => 0,
            Self::Replace => 1,
            Self::Delete => 3,
        }
    }

    /// Parses a wire code.
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Create),
            1 => Some(Self::Replace),
            3 => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Create transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentCreateTransition {
    /// Derived document id.
    pub id: Identifier,
    /// Document type.
    pub document_type: String,
    /// Defining data contract.
    pub data_contract_id: Identifier,
    /// Entropy bound into `id`.
    pub entropy: String,
    /// Creation timestamp.
    pub created_at: Option<u64>,
    /// Update timestamp.
    pub updated_at: Option<u64>,
    /// Initial user data, native form.
    pub data: Map<String, Value>,
}

impl DocumentCreateTransition {
    /// Builds a create transition for `document`, which must carry its
    /// creation entropy.
    pub fn from_document(document: &Document) -> Result<Self, DppError> {
        let entropy = document.entropy().ok_or(DppError::MissingEntropy)?;
        Ok(Self {
            id: document.id(),
            document_type: document.document_type().to_string(),
            data_contract_id: document.data_contract_id(),
            entropy: entropy.to_string(),
            created_at: document.created_at(),
            updated_at: document.updated_at(),
            data: document.get_data().clone(),
        })
    }

    /// Id the derivation formula yields for `owner_id`, `None` when the
    /// entropy cannot be decoded.
    pub fn expected_id(&self, owner_id: &Identifier) -> Option<Identifier> {
        let bytes = entropy::decode(&self.entropy)?;
        Some(generate_document_id(
            &self.data_contract_id,
            owner_id,
            &self.document_type,
            &bytes,
        ))
    }
}

/// Replace transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReplaceTransition {
    /// Target document id.
    pub id: Identifier,
    /// Document type.
    pub document_type: String,
    /// Defining data contract.
    pub data_contract_id: Identifier,
    /// Declared new revision.
    pub revision: u64,
    /// Update timestamp.
    pub updated_at: Option<u64>,
    /// Replacement user data, native form.
    pub data: Map<String, Value>,
}

impl DocumentReplaceTransition {
    /// Builds a replace transition declaring `document.revision() + 1`.
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id(),
            document_type: document.document_type().to_string(),
            data_contract_id: document.data_contract_id(),
            revision: document.revision() + 1,
            updated_at: document.updated_at(),
            data: document.get_data().clone(),
        }
    }
}

/// Delete transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDeleteTransition {
    /// Target document id.
    pub id: Identifier,
    /// Document type.
    pub document_type: String,
    /// Defining data contract.
    pub data_contract_id: Identifier,
}

impl DocumentDeleteTransition {
    /// Builds a delete transition for `document`.
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id(),
            document_type: document.document_type().to_string(),
            data_contract_id: document.data_contract_id(),
        }
    }
}

/// One document transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentTransition {
    /// Create.
    Create(DocumentCreateTransition),
    /// Replace.
    Replace(DocumentReplaceTransition),
    /// Delete.
    Delete(DocumentDeleteTransition),
}

impl DocumentTransition {
    /// Action of the transition.
    pub fn action(&self) -> Action {
        match self {
            Self::Create(_) => Action::Create,
            Self::Replace(_) => Action::Replace,
            Self::Delete(_) => Action::Delete,
        }
    }

    /// Target document id.
    pub fn id(&self) -> Identifier {
        match self {
            Self::Create(t) => t.id,
            Self::Replace(t) => t.id,
            Self::Delete(t) => t.id,
        }
    }

    /// Document type.
    pub fn document_type(&self) -> &str {
        match self {
            Self::Create(t) => &t.document_type,
            Self::Replace(t) => &t.document_type,
            Self::Delete(t) => &t.document_type,
        }
    }

    /// Defining data contract.
    pub fn data_contract_id(&self) -> Identifier {
        match self {
            Self::Create(t) => t.data_contract_id,
            Self::Replace(t) => t.data_contract_id,
            Self::Delete(t) => t.data_contract_id,
        }
    }

    /// User data carried by Create and Replace.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Create(t) => Some(&t.data),
            Self::Replace(t) => Some(&t.data),
            Self::Delete(_) => None,
        }
    }

    /// Reads a system property or a dotted user data path.
    pub fn get(&self, path: &str) -> Option<Value> {
        match (path, self) {
            ("$id", _) => Some(self.id().to_value()),
            ("$type", _) => Some(json!(self.document_type())),
            ("$dataContractId", _) => Some(self.data_contract_id().to_value()),
            ("$createdAt", Self::Create(t)) => t.created_at.map(Value::from),
            ("$updatedAt", Self::Create(t)) => t.updated_at.map(Value::from),
            ("$updatedAt", Self::Replace(t)) => t.updated_at.map(Value::from),
            ("$revision", Self::Replace(t)) => Some(json!(t.revision)),
            _ if path.starts_with('$') => None,
            _ => property_path::get(self.data()?, path).cloned(),
        }
    }

    /// Native object form.
    pub fn to_object(&self) -> Value {
        let mut object = Map::new();
        object.insert("$action".into(), json!(self.action().code()));
        object.insert("$id".into(), self.id().to_value());
        object.insert("$type".into(), json!(self.document_type()));
        object.insert("$dataContractId".into(), self.data_contract_id().to_value());

        match self {
            Self::Create(t) => {
                object.insert("$entropy".into(), json!(t.entropy));
                if let Some(created_at) = t.created_at {
                    object.insert("$createdAt".into(), json!(created_at));
                }
                if let Some(updated_at) = t.updated_at {
                    object.insert("$updatedAt".into(), json!(updated_at));
                }
            }
            Self::Replace(t) => {
                object.insert("$revision".into(), json!(t.revision));
                if let Some(updated_at) = t.updated_at {
                    object.insert("$updatedAt".into(), json!(updated_at));
                }
            }
            Self::Delete(_) => {}
        }

        if let Some(data) = self.data() {
            for (key, value) in data {
                object.insert(key.clone(), value.clone());
            }
        }
        Value::Object(object)
    }

    /// Text form: binary data rendered per `contract`.
    pub fn to_json(&self, contract: &DataContract) -> Result<Value, DppError> {
        let mut object = self.to_object();
        if let (Value::Object(map), Some(_)) = (&mut object, self.data()) {
            let encoded = contract.get_encoded_properties(self.document_type())?;
            to_text_form(map, &encoded);
        }
        Ok(object)
    }

    /// Parses the native object form.
    pub fn from_object(raw: &Value) -> Result<Self, DppError> {
        let object = raw
            .as_object()
            .ok_or_else(|| DppError::MalformedObject("transition is not an object".into()))?;

        let action_value = object
            .get("$action")
            .ok_or_else(|| DppError::MalformedObject("missing `$action`".into()))?;
        let action = integral::as_u64(action_value)
            .and_then(Action::from_code)
            .ok_or_else(|| ApplyError::InvalidDocumentAction {
                action: action_value.clone(),
            })?;

        let id = Identifier::from_value(required(object, "$id")?)?;
        let data_contract_id = Identifier::from_value(required(object, "$dataContractId")?)?;
        let document_type = required(object, "$type")?
            .as_str()
            .ok_or_else(|| DppError::MalformedObject("`$type` is not a string".into()))?
            .to_string();

        let data: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| !key.starts_with('$'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let transition = match action {
            Action::Create => Self::Create(DocumentCreateTransition {
                id,
                document_type,
                data_contract_id,
                entropy: required(object, "$entropy")?
                    .as_str()
                    .ok_or_else(|| DppError::MalformedObject("`$entropy` is not a string".into()))?
                    .to_string(),
                created_at: optional_u64(object, "$createdAt")?,
                updated_at: optional_u64(object, "$updatedAt")?,
                data,
            }),
            Action::Replace => Self::Replace(DocumentReplaceTransition {
                id,
                document_type,
                data_contract_id,
                revision: revision(required(object, "$revision")?)?,
                updated_at: optional_u64(object, "$updatedAt")?,
                data,
            }),
            Action::Delete => Self::Delete(DocumentDeleteTransition {
                id,
                document_type,
                data_contract_id,
            }),
        };
        Ok(transition)
    }
}

fn required<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a Value, DppError> {
    object
        .get(name)
        .ok_or_else(|| DppError::MalformedObject(format!("missing `{name}`")))
}

fn optional_u64(object: &Map<String, Value>, name: &str) -> Result<Option<u64>, DppError> {
    match object.get(name) {
        None => Ok(None),
        Some(value) => integral::as_u64(value)
            .map(Some)
            .ok_or_else(|| DppError::MalformedObject(format!("invalid `{name}`"))),
    }
}

fn revision(value: &Value) -> Result<u64, DppError> {
    integral::as_u64(value)
        .filter(|revision| *revision >= 1)
        .ok_or_else(|| DppError::MalformedObject("invalid `$revision`".into()))
}
