//! # Documents Batch Basic Validation
//!
//! Structural and batch-local checks of a raw documents batch.
//!
//! ## Order
//!
//! 1. Batch envelope schema (stops on failure)
//! 2. Grouping by `$dataContractId`
//! 3. Per group, concurrently across groups, merged in first-seen order:
//!    - fetch the data contract (`DataContractNotPresent` ends the group)
//!    - per transition, in batch order: `$type`, `$action`, enriched schema,
//!      then entropy and id for Create
//!    - when every transition passed: duplicates by id, then duplicates by
//!      unique index

use crate::domain::data_contract::DataContract;
use crate::domain::document_transition::Action;
use crate::domain::duplicates::{find_duplicates_by_id, find_duplicates_by_indices};
use crate::domain::encoded_properties::to_text_form;
use crate::domain::enrichment::enrich_data_contract_with_base_schema;
use crate::domain::entropy;
use crate::domain::identifiers::generate_document_id;
use crate::domain::integral;
use crate::domain::schemas::{
    DOCUMENTS_BATCH_TRANSITION_SCHEMA, DOCUMENT_TRANSITION_BASE_SCHEMA,
    DOCUMENT_TRANSITION_CREATE_SCHEMA, DOCUMENT_TRANSITION_REPLACE_SCHEMA,
};
use crate::domain::validation_result::ValidationResult;
use crate::errors::{ConsensusError, DppError};
use crate::ports::outbound::{JsonSchemaValidator, StateRepository};
use futures::future::join_all;
use serde_json::Value;
use shared_types::Identifier;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Basic validator for raw documents batches.
pub struct DocumentsBatchBasicValidator<V: JsonSchemaValidator, R: StateRepository> {
    json_schema_validator: Arc<V>,
    state_repository: Arc<R>,
}

/// Data contract schemas enriched once per group.
struct EnrichedContracts {
    create: DataContract,
    replace: DataContract,
}

impl<V: JsonSchemaValidator, R: StateRepository> DocumentsBatchBasicValidator<V, R> {
    /// Creates a validator.
    pub fn new(json_schema_validator: Arc<V>, state_repository: Arc<R>) -> Self {
        Self {
            json_schema_validator,
            state_repository,
        }
    }

    /// Validates `raw_batch` (object form).
    ///
    /// `Err` only on repository failure or an unusable contract.
    #[instrument(skip(self, raw_batch))]
    pub async fn validate(&self, raw_batch: &Value) -> Result<ValidationResult, DppError> {
        let mut result = self.json_schema_validator.validate(
            &DOCUMENTS_BATCH_TRANSITION_SCHEMA,
            raw_batch,
            &BTreeMap::new(),
        );
        if !result.is_valid() {
            return Ok(result);
        }

        let owner_id = Identifier::from_value(&raw_batch["ownerId"])?;
        let raw_transitions = raw_batch["transitions"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut groups: Vec<(Identifier, Vec<&Value>)> = Vec::new();
        let mut positions: HashMap<Identifier, usize> = HashMap::new();
        for raw_transition in raw_transitions {
            let data_contract_id = raw_transition
                .get("$dataContractId")
                .and_then(|value| Identifier::from_value(value).ok());
            let Some(data_contract_id) = data_contract_id else {
                result.add_error(ConsensusError::MissingDataContractId {
                    raw_transition: raw_transition.clone(),
                });
                continue;
            };
            let position = *positions.entry(data_contract_id).or_insert_with(|| {
                groups.push((data_contract_id, Vec::new()));
                groups.len() - 1
            });
            groups[position].1.push(raw_transition);
        }

        let group_results = join_all(groups.iter().map(|(data_contract_id, transitions)| {
            self.validate_group(*data_contract_id, transitions, owner_id)
        }))
        .await;
        for group_result in group_results {
            result.merge(group_result?);
        }

        debug!(
            groups = groups.len(),
            errors = result.errors().len(),
            "[dpp] documents batch basic validation finished"
        );
        Ok(result)
    }

    async fn validate_group(
        &self,
        data_contract_id: Identifier,
        raw_transitions: &[&Value],
        owner_id: Identifier,
    ) -> Result<ValidationResult, DppError> {
        let Some(data_contract) = self
            .state_repository
            .fetch_data_contract(&data_contract_id)
            .await?
        else {
            return Ok(ConsensusError::DataContractNotPresent { data_contract_id }.into());
        };

        let enriched = EnrichedContracts {
            create: enrich_data_contract_with_base_schema(
                &data_contract,
                &[
                    &*DOCUMENT_TRANSITION_BASE_SCHEMA,
                    &*DOCUMENT_TRANSITION_CREATE_SCHEMA,
                ],
                &[],
            ),
            replace: enrich_data_contract_with_base_schema(
                &data_contract,
                &[
                    &*DOCUMENT_TRANSITION_BASE_SCHEMA,
                    &*DOCUMENT_TRANSITION_REPLACE_SCHEMA,
                ],
                &["$createdAt"],
            ),
        };

        let mut result = ValidationResult::new();
        for raw_transition in raw_transitions {
            result.merge(self.validate_transition(
                raw_transition,
                &data_contract,
                &enriched,
                &owner_id,
            )?);
        }
        if !result.is_valid() {
            return Ok(result);
        }

        let raw_transitions: Vec<Value> = raw_transitions
            .iter()
            .map(|raw_transition| (*raw_transition).clone())
            .collect();

        let by_id = find_duplicates_by_id(&raw_transitions);
        if !by_id.is_empty() {
            result.add_error(duplicate_transitions(&by_id));
        }
        let by_indices = find_duplicates_by_indices(&raw_transitions, &data_contract);
        if !by_indices.is_empty() {
            result.add_error(duplicate_transitions(&by_indices));
        }

        Ok(result)
    }

    fn validate_transition(
        &self,
        raw_transition: &Value,
        data_contract: &DataContract,
        enriched: &EnrichedContracts,
        owner_id: &Identifier,
    ) -> Result<ValidationResult, DppError> {
        let Some(type_value) = raw_transition.get("$type") else {
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

        let Some(action_value) = raw_transition.get("$action") else {
            return Ok(ConsensusError::MissingDocumentTransitionAction.into());
        };
        let Some(action) = integral::as_u64(action_value).and_then(Action::from_code) else {
            return Ok(ConsensusError::InvalidDocumentTransitionAction {
                action: action_value.clone(),
            }
            .into());
        };

        let encoded = data_contract.get_encoded_properties(document_type)?;
        let mut text_form = raw_transition.clone();
        if let Value::Object(object) = &mut text_form {
            to_text_form(object, &encoded);
        }

        let result = match action {
            Action::Create => {
                let mut result = self.validate_against(&enriched.create, document_type, &text_form)?;
                if result.is_valid() {
                    result.merge(validate_create_binding(
                        raw_transition,
                        data_contract,
                        document_type,
                        owner_id,
                    ));
                }
                result
            }
            Action::Replace => self.validate_against(&enriched.replace, document_type, &text_form)?,
            Action::Delete => self.json_schema_validator.validate(
                &DOCUMENT_TRANSITION_BASE_SCHEMA,
                &text_form,
                &BTreeMap::new(),
            ),
        };
        Ok(result)
    }

    fn validate_against(
        &self,
        enriched: &DataContract,
        document_type: &str,
        text_form: &Value,
    ) -> Result<ValidationResult, DppError> {
        let schema_ref = enriched.get_document_schema_ref(document_type)?;
        Ok(self.json_schema_validator.validate(
            &schema_ref,
            text_form,
            &enriched.additional_schemas(),
        ))
    }
}

/// Entropy validity, then the id derivation when the entropy decodes.
fn validate_create_binding(
    raw_transition: &Value,
    data_contract: &DataContract,
    document_type: &str,
    owner_id: &Identifier,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let entropy_text = raw_transition
        .get("$entropy")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let Some(entropy_bytes) = entropy::decode(entropy_text) else {
        result.add_error(ConsensusError::InvalidDocumentTransitionEntropy {
            entropy: entropy_text.to_string(),
        });
        return result;
    };
    if !entropy::is_valid(entropy_text) {
        result.add_error(ConsensusError::InvalidDocumentTransitionEntropy {
            entropy: entropy_text.to_string(),
        });
    }

    let expected_id = generate_document_id(
        &data_contract.id(),
        owner_id,
        document_type,
        &entropy_bytes,
    );
    let actual_id = raw_transition
        .get("$id")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if actual_id != expected_id.to_hex() {
        result.add_error(ConsensusError::InvalidDocumentTransitionId {
            expected_id,
            actual_id: actual_id.to_string(),
        });
    }
    result
}

fn duplicate_transitions(raw_transitions: &[&Value]) -> ConsensusError {
    let references = raw_transitions
        .iter()
        .map(|raw| {
            let text = |key: &str| {
                raw.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            (text("$type"), text("$id"))
        })
        .collect();
    ConsensusError::DuplicateDocumentTransitions { references }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json_schema::DraftSchemaValidator;
    use crate::adapters::memory_repository::InMemoryStateRepository;
    use crate::domain::document_transition::{DocumentCreateTransition, DocumentTransition};
    use crate::domain::documents_batch_transition::DocumentsBatchTransition;
    use crate::domain::state_transition::StateTransitionLike;
    use serde_json::{json, Map};

    const OWNER: Identifier = Identifier::new([3u8; 32]);

    fn contract() -> DataContract {
        let documents = json!({
            "note": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "maxLength": 20 },
                    "cover": { "type": "string", "contentEncoding": "base64" }
                },
                "required": ["title"],
                "indices": [
                    { "properties": [{ "$ownerId": "asc" }, { "title": "asc" }], "unique": true }
                ],
                "additionalProperties": false
            }
        });
        DataContract::new(
            0,
            OWNER,
            documents.as_object().cloned().unwrap(),
            entropy::generate(),
        )
        .unwrap()
    }

    fn create(contract: &DataContract, title: &str) -> DocumentTransition {
        let entropy = entropy::generate();
        let bytes = entropy::decode(&entropy).unwrap();
        let data: Map<String, Value> = json!({ "title": title, "cover": [1, 2, 3] })
            .as_object()
            .cloned()
            .unwrap();
        DocumentTransition::Create(DocumentCreateTransition {
            id: generate_document_id(&contract.id(), &OWNER, "note", &bytes),
            document_type: "note".into(),
            data_contract_id: contract.id(),
            entropy,
            created_at: None,
            updated_at: None,
            data,
        })
    }

    fn signed_batch(transitions: Vec<DocumentTransition>) -> Value {
        let mut batch = DocumentsBatchTransition::new(0, OWNER, transitions);
        batch.set_signature(0, vec![7u8; 64]);
        batch.to_object(false)
    }

    fn setup() -> (
        DocumentsBatchBasicValidator<DraftSchemaValidator, InMemoryStateRepository>,
        DataContract,
    ) {
        let repository = Arc::new(InMemoryStateRepository::new());
        let contract = contract();
        repository.insert_data_contract(contract.clone());
        let validator =
            DocumentsBatchBasicValidator::new(Arc::new(DraftSchemaValidator::new()), repository);
        (validator, contract)
    }

    #[tokio::test]
    async fn test_valid_batch() {
        let (validator, contract) = setup();
        let raw = signed_batch(vec![create(&contract, "a"), create(&contract, "b")]);

        let result = validator.validate(&raw).await.unwrap();
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[tokio::test]
    async fn test_envelope_schema_failure_stops() {
        let (validator, contract) = setup();
        let mut raw = signed_batch(vec![create(&contract, "a")]);
        raw["transitions"] = json!([]);

        let result = validator.validate(&raw).await.unwrap();
        assert!(matches!(
            result.errors(),
            [ConsensusError::JsonSchema(error)] if error.keyword == "minItems"
        ));
    }

    #[tokio::test]
    async fn test_missing_contract_id_and_absent_contract() {
        let (validator, contract) = setup();
        let mut raw = signed_batch(vec![create(&contract, "a"), create(&contract, "b")]);
        raw["transitions"][0]
            .as_object_mut()
            .unwrap()
            .remove("$dataContractId");
        raw["transitions"][1]["$dataContractId"] = json!(Identifier::new([8u8; 32]).to_hex());

        let result = validator.validate(&raw).await.unwrap();
        assert!(matches!(
            result.errors(),
            [
                ConsensusError::MissingDataContractId { .. },
                ConsensusError::DataContractNotPresent { .. },
            ]
        ));
    }

    #[tokio::test]
    async fn test_type_and_action_checks() {
        let (validator, contract) = setup();
        let mut raw = signed_batch(vec![
            create(&contract, "a"),
            create(&contract, "b"),
            create(&contract, "c"),
            create(&contract, "d"),
        ]);
        raw["transitions"][0].as_object_mut().unwrap().remove("$type");
        raw["transitions"][1]["$type"] = json!("tag");
        raw["transitions"][2].as_object_mut().unwrap().remove("$action");
        raw["transitions"][3]["$action"] = json!(2);

        let result = validator.validate(&raw).await.unwrap();
        assert!(matches!(
            result.errors(),
            [
                ConsensusError::MissingDocumentType,
                ConsensusError::InvalidDocumentType { .. },
                ConsensusError::MissingDocumentTransitionAction,
                ConsensusError::InvalidDocumentTransitionAction { .. },
            ]
        ));
    }

    #[tokio::test]
    async fn test_create_schema_runs_on_text_form() {
        let (validator, contract) = setup();
        let mut raw = signed_batch(vec![create(&contract, "a")]);
        raw["transitions"][0]["title"] = json!("x".repeat(21));

        let result = validator.validate(&raw).await.unwrap();
        assert!(matches!(
            result.errors(),
            [ConsensusError::JsonSchema(error)] if error.keyword == "maxLength"
        ));
    }

    #[tokio::test]
    async fn test_entropy_and_id_binding() {
        let (validator, contract) = setup();

        let mut raw = signed_batch(vec![create(&contract, "a")]);
        raw["transitions"][0]["$entropy"] = json!(entropy::generate());
        let result = validator.validate(&raw).await.unwrap();
        assert!(matches!(
            result.errors(),
            [ConsensusError::InvalidDocumentTransitionId { .. }]
        ));

        // Repeated-byte entropy with a matching id still fails the entropy rule.
        let weak = "11".repeat(17);
        let bytes = entropy::decode(&weak).unwrap();
        let mut raw = signed_batch(vec![create(&contract, "a")]);
        raw["transitions"][0]["$entropy"] = json!(weak);
        raw["transitions"][0]["$id"] =
            json!(generate_document_id(&contract.id(), &OWNER, "note", &bytes).to_hex());
        let result = validator.validate(&raw).await.unwrap();
        assert!(matches!(
            result.errors(),
            [ConsensusError::InvalidDocumentTransitionEntropy { .. }]
        ));
    }

    #[tokio::test]
    async fn test_duplicates_reported_per_kind() {
        let (validator, contract) = setup();
        let first = create(&contract, "same");
        let raw = signed_batch(vec![first.clone(), create(&contract, "same"), first]);

        let result = validator.validate(&raw).await.unwrap();
        let [ConsensusError::DuplicateDocumentTransitions { references: by_id }, ConsensusError::DuplicateDocumentTransitions { references: by_index }] =
            result.errors()
        else {
            panic!("unexpected errors {:?}", result.errors());
        };
        assert_eq!(by_id.len(), 2);
        assert_eq!(by_index.len(), 3);
    }

    #[tokio::test]
    async fn test_repository_failure_aborts() {
        let repository = Arc::new(InMemoryStateRepository::new());
        let contract = contract();
        repository.set_unavailable(true);
        let validator = DocumentsBatchBasicValidator::new(
            Arc::new(DraftSchemaValidator::new()),
            Arc::clone(&repository),
        );
        let raw = signed_batch(vec![create(&contract, "a")]);

        assert!(matches!(
            validator.validate(&raw).await,
            Err(DppError::StateRepository(_))
        ));
    }
}
