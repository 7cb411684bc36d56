//! # Document Factory
//!
//! Creates documents, reconstructs them from wire forms and assembles
//! documents batches.
//!
//! | Operation | Validates | Needs the repository |
//! |-----------|-----------|----------------------|
//! | `create` | no | no |
//! | `create_from_object` | unless skipped | unless skipped |
//! | `create_from_json` | unless skipped | yes |
//! | `create_from_buffer` | unless skipped | unless skipped |
//! | `create_state_transition` | no | no |

use crate::config::PlatformConfig;
use crate::domain::data_contract::DataContract;
use crate::domain::document::Document;
use crate::domain::document_transition::{
    DocumentCreateTransition, DocumentDeleteTransition, DocumentReplaceTransition,
    DocumentTransition,
};
use crate::domain::documents_batch_transition::DocumentsBatchTransition;
use crate::domain::encoded_properties::to_text_form;
use crate::domain::entropy;
use crate::domain::identifiers::generate_document_id;
use crate::domain::limits::INITIAL_REVISION;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::{JsonSchemaValidator, StateRepository, TimeSource};
use crate::validation::document::DocumentValidator;
use serde_json::{Map, Value};
use shared_types::{codec, Identifier};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Documents to put into one batch, grouped by action.
#[derive(Debug, Clone, Default)]
pub struct DocumentsByAction {
    /// Documents to create.
    pub create: Vec<Document>,
    /// Stored documents with their new data; the batch declares revision + 1.
    pub replace: Vec<Document>,
    /// Stored documents to delete.
    pub delete: Vec<Document>,
}

/// Factory for documents and documents batches.
pub struct DocumentFactory<V: JsonSchemaValidator, R: StateRepository, T: TimeSource> {
    protocol_version: u32,
    validator: DocumentValidator<V>,
    state_repository: Arc<R>,
    time_source: Arc<T>,
}

impl<V, R, T> DocumentFactory<V, R, T>
where
    V: JsonSchemaValidator,
    R: StateRepository,
    T: TimeSource,
{
    /// Creates a factory stamping `config.protocol_version`.
    pub fn new(
        json_schema_validator: Arc<V>,
        state_repository: Arc<R>,
        time_source: Arc<T>,
        config: &PlatformConfig,
    ) -> Self {
        Self {
            protocol_version: config.protocol_version,
            validator: DocumentValidator::new(json_schema_validator),
            state_repository,
            time_source,
        }
    }

    /// Fresh document of `document_type` at the initial revision.
    ///
    /// `$createdAt` and `$updatedAt` are stamped when the type's schema
    /// requires them. `data` is not validated.
    pub fn create(
        &self,
        data_contract: &DataContract,
        owner_id: Identifier,
        document_type: &str,
        data: Map<String, Value>,
    ) -> Result<Document, DppError> {
        if !data_contract.is_document_defined(document_type) {
            return Err(DppError::InvalidDocumentType {
                document_type: document_type.to_string(),
                data_contract_id: data_contract.id(),
            });
        }

        let entropy = entropy::generate();
        let entropy_bytes = entropy::decode(&entropy).ok_or(DppError::MissingEntropy)?;
        let id = generate_document_id(&data_contract.id(), &owner_id, document_type, &entropy_bytes);

        let required = required_properties(data_contract.get_document_schema(document_type)?);
        let now = self.time_source.now_millis();
        let stamp = |name: &str| required.contains(&name).then_some(now);

        let mut document = Document::new(
            id,
            document_type,
            data_contract.id(),
            owner_id,
            INITIAL_REVISION,
            stamp("$createdAt"),
            stamp("$updatedAt"),
            Map::new(),
        );
        document.set_data(data);
        document.set_entropy(Some(entropy));

        debug!(document_id = %id, document_type, "[dpp] document created");
        Ok(document)
    }

    /// Reconstructs a document from its native object form.
    #[instrument(skip(self, raw_document))]
    pub async fn create_from_object(
        &self,
        raw_document: &Value,
        skip_validation: bool,
    ) -> Result<Document, DppError> {
        if !skip_validation {
            let data_contract = self.fetch_data_contract(raw_document).await?;
            let text_form = native_to_text(raw_document, &data_contract)?;
            self.ensure_valid(&text_form, raw_document, &data_contract)?;
        }
        Document::from_object(raw_document)
    }

    /// Reconstructs a document from its text form.
    #[instrument(skip(self, raw_document))]
    pub async fn create_from_json(
        &self,
        raw_document: &Value,
        skip_validation: bool,
    ) -> Result<Document, DppError> {
        let data_contract = self.fetch_data_contract(raw_document).await?;
        if !skip_validation {
            self.ensure_valid(raw_document, raw_document, &data_contract)?;
        }
        Document::from_json(raw_document, &data_contract)
    }

    /// Reconstructs a document from canonical bytes.
    pub async fn create_from_buffer(
        &self,
        bytes: &[u8],
        skip_validation: bool,
    ) -> Result<Document, DppError> {
        let raw_document = codec::decode(bytes).map_err(|error| DppError::InvalidDocument {
            errors: vec![ConsensusError::SerializedObjectParsing {
                message: error.to_string(),
            }],
            raw: Value::Null,
        })?;
        self.create_from_object(&raw_document, skip_validation).await
    }

    /// Unsigned batch over `documents`, in create, replace, delete order.
    pub fn create_state_transition(
        &self,
        documents: DocumentsByAction,
    ) -> Result<DocumentsBatchTransition, DppError> {
        let owner_id = documents
            .create
            .iter()
            .chain(&documents.replace)
            .chain(&documents.delete)
            .next()
            .map(Document::owner_id)
            .ok_or(DppError::NoDocumentsSupplied)?;

        if let Some(found) = documents
            .create
            .iter()
            .chain(&documents.replace)
            .chain(&documents.delete)
            .map(Document::owner_id)
            .find(|found| *found != owner_id)
        {
            return Err(DppError::MismatchOwnerIds {
                expected: owner_id,
                found,
            });
        }

        let mut transitions = Vec::with_capacity(
            documents.create.len() + documents.replace.len() + documents.delete.len(),
        );
        for document in &documents.create {
            transitions.push(DocumentTransition::Create(
                DocumentCreateTransition::from_document(document)?,
            ));
        }
        transitions.extend(documents.replace.iter().map(|document| {
            DocumentTransition::Replace(DocumentReplaceTransition::from_document(document))
        }));
        transitions.extend(documents.delete.iter().map(|document| {
            DocumentTransition::Delete(DocumentDeleteTransition::from_document(document))
        }));

        Ok(DocumentsBatchTransition::new(
            self.protocol_version,
            owner_id,
            transitions,
        ))
    }

    async fn fetch_data_contract(&self, raw_document: &Value) -> Result<Arc<DataContract>, DppError> {
        let invalid = |error: ConsensusError| DppError::InvalidDocument {
            errors: vec![error],
            raw: raw_document.clone(),
        };

        let Some(data_contract_id) = raw_document
            .get("$dataContractId")
            .and_then(|value| Identifier::from_value(value).ok())
        else {
            return Err(invalid(ConsensusError::MissingDataContractId {
                raw_transition: raw_document.clone(),
            }));
        };

        self.state_repository
            .fetch_data_contract(&data_contract_id)
            .await?
            .ok_or_else(|| invalid(ConsensusError::DataContractNotPresent { data_contract_id }))
    }

    fn ensure_valid(
        &self,
        text_form: &Value,
        raw_document: &Value,
        data_contract: &DataContract,
    ) -> Result<(), DppError> {
        let result = self.validator.validate(text_form, data_contract)?;
        if result.is_valid() {
            return Ok(());
        }
        Err(DppError::InvalidDocument {
            errors: result.into_errors(),
            raw: raw_document.clone(),
        })
    }
}

fn required_properties(document_schema: &Value) -> Vec<&str> {
    document_schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect()
}

/// Text form of a native raw document, when its type is defined.
fn native_to_text(raw_document: &Value, data_contract: &DataContract) -> Result<Value, DppError> {
    let mut text_form = raw_document.clone();
    let document_type = raw_document
        .get("$type")
        .and_then(Value::as_str)
        .filter(|document_type| data_contract.is_document_defined(document_type));
    if let (Some(document_type), Value::Object(object)) = (document_type, &mut text_form) {
        let encoded = data_contract.get_encoded_properties(document_type)?;
        to_text_form(object, &encoded);
    }
    Ok(text_form)
}
