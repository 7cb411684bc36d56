//! # Error Types
//!
//! Three vocabularies with different roles:
//!
//! | Type | Role | Surfaced as |
//! |------|------|-------------|
//! | `ConsensusError` | Expected invalid input | Accumulated in `ValidationResult` |
//! | `ApplyError` | Caller skipped or misordered validation | `Err` from appliers |
//! | `DppError` | Everything a factory or pipeline can throw | `Err` |

use serde_json::Value;
use shared_crypto::CryptoError;
use shared_types::{CodecError, Identifier, IdentifierError};
use thiserror::Error;

// =============================================================================
// SCHEMA DIAGNOSTICS
// =============================================================================

/// A single diagnostic produced by the JSON-Schema capability.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (keyword `{keyword}` at `{instance_path}`)")]
pub struct JsonSchemaError {
    /// Failing keyword, e.g. `required`, `pattern`, `$ref`.
    pub keyword: String,
    /// JSON pointer to the offending value in the instance.
    pub instance_path: String,
    /// Location of the failing keyword in the schema.
    pub schema_path: String,
    /// Human readable description.
    pub message: String,
    /// Keyword specific parameters, e.g. `{"missingProperty": "$id"}`.
    pub params: Value,
}

impl JsonSchemaError {
    /// Creates a diagnostic with empty params.
    pub fn new(
        keyword: impl Into<String>,
        instance_path: impl Into<String>,
        schema_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            instance_path: instance_path.into(),
            schema_path: schema_path.into(),
            message: message.into(),
            params: Value::Null,
        }
    }

    /// Attaches keyword parameters.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

// =============================================================================
// CONSENSUS ERRORS
// =============================================================================

/// Expected-invalid-input errors. Part of the consensus contract: every node
/// must report the same kinds in the same order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsensusError {
    /// Structural schema violation.
    #[error(transparent)]
    JsonSchema(#[from] JsonSchemaError),

    /// Canonical bytes could not be produced or parsed.
    #[error("Serialized object parsing failed: {message}")]
    SerializedObjectParsing { message: String },

    // --- Data contract -------------------------------------------------------
    /// Canonical encoding of the data contract is too large.
    #[error("Data contract size {size} bytes reaches the maximum of {max_size} bytes")]
    DataContractMaxByteSizeExceeded { size: usize, max_size: usize },

    /// Dereferenced schema nesting is too deep.
    #[error("Data contract depth {depth} exceeds the maximum of {max_depth}")]
    DataContractMaxDepthExceeded { depth: usize, max_depth: usize },

    /// Owner is not on the configured allow-list.
    #[error("Identity {owner_id} is not allowed to register data contracts")]
    DataContractRestrictedIdentity { owner_id: Identifier },

    /// More unique indices than permitted for one document type.
    #[error("Document type `{document_type}` declares more than {limit} unique indices")]
    UniqueIndicesLimitReached { document_type: String, limit: usize },

    /// Index over a property that is already indexed implicitly.
    #[error("System property `{property_name}` of `{document_type}` is already indexed")]
    SystemPropertyIndexAlreadyPresent {
        document_type: String,
        index_definition: Value,
        property_name: String,
    },

    /// Indexed property resolves to an object or a non-scalar array.
    #[error("Property `{property_name}` of `{document_type}` has non-indexable type `{property_type}`")]
    InvalidIndexPropertyType {
        document_type: String,
        index_definition: Value,
        property_name: String,
        property_type: String,
    },

    /// Same index definition declared twice.
    #[error("Duplicate index definition for `{document_type}`")]
    DuplicateIndex {
        document_type: String,
        index_definition: Value,
    },

    /// Index references a user property missing from the schema.
    #[error("Index of `{document_type}` references undefined property `{property_name}`")]
    UndefinedIndexProperty {
        document_type: String,
        index_definition: Value,
        property_name: String,
    },

    /// Data contract entropy fails the randomness check.
    #[error("Invalid data contract entropy `{entropy}`")]
    InvalidDataContractEntropy { entropy: String },

    /// Data contract id does not match owner id and entropy.
    #[error("Invalid data contract id `{actual_id}`, expected {expected_id}")]
    InvalidDataContractId {
        expected_id: Identifier,
        actual_id: String,
    },

    /// Data contract with this id is already registered.
    #[error("Data contract {data_contract_id} is already present")]
    DataContractAlreadyPresent { data_contract_id: Identifier },

    /// Referenced data contract does not exist.
    #[error("Data contract {data_contract_id} is not present")]
    DataContractNotPresent { data_contract_id: Identifier },

    // --- Document transitions ------------------------------------------------
    /// Transition has no usable `$dataContractId`.
    #[error("Document transition has no valid $dataContractId")]
    MissingDataContractId { raw_transition: Value },

    /// `$type` is absent.
    #[error("Document type is missing")]
    MissingDocumentType,

    /// `$type` is not defined by the data contract.
    #[error("Document type `{document_type}` is not defined in data contract {data_contract_id}")]
    InvalidDocumentType {
        document_type: String,
        data_contract_id: Identifier,
    },

    /// `$action` is absent.
    #[error("Document transition action is missing")]
    MissingDocumentTransitionAction,

    /// `$action` is not a known action code.
    #[error("Invalid document transition action {action}")]
    InvalidDocumentTransitionAction { action: Value },

    /// Create transition `$id` does not match the derivation formula.
    #[error("Invalid document transition id `{actual_id}`, expected {expected_id}")]
    InvalidDocumentTransitionId {
        expected_id: Identifier,
        actual_id: String,
    },

    /// Create transition `$entropy` fails the randomness check.
    #[error("Invalid document transition entropy `{entropy}`")]
    InvalidDocumentTransitionEntropy { entropy: String },

    /// Transitions in one batch collide by id or by unique index.
    #[error("Duplicate document transitions: {references:?}")]
    DuplicateDocumentTransitions {
        /// `(document type, document id)` of every colliding transition.
        references: Vec<(String, String)>,
    },

    // --- Document state ------------------------------------------------------
    /// Create targets an id that is already stored.
    #[error("Document {document_id} is already present")]
    DocumentAlreadyPresent { document_id: Identifier },

    /// Replace or delete targets a document that is not stored.
    #[error("Document {document_id} was not found")]
    DocumentNotFound { document_id: Identifier },

    /// Replace revision is not exactly stored revision + 1.
    #[error("Invalid revision {declared_revision} for document {document_id} at revision {current_revision}")]
    InvalidDocumentRevision {
        document_id: Identifier,
        current_revision: u64,
        declared_revision: u64,
    },

    /// Stored document belongs to another identity.
    #[error("Document {document_id} is owned by {document_owner_id}, not {owner_id}")]
    InvalidDocumentOwner {
        document_id: Identifier,
        document_owner_id: Identifier,
        owner_id: Identifier,
    },

    /// Stored document already holds these unique index values.
    #[error("Document {document_id} of `{document_type}` violates a unique index")]
    DuplicateDocument {
        document_id: Identifier,
        document_type: String,
        index_definition: Value,
    },

    // --- State transitions ---------------------------------------------------
    /// `type` is absent.
    #[error("State transition type is missing")]
    MissingStateTransitionType,

    /// `type` is not a known state transition type.
    #[error("Invalid state transition type {state_transition_type}")]
    InvalidStateTransitionType { state_transition_type: Value },

    /// Canonical encoding of the state transition is too large.
    #[error("State transition size {size} bytes exceeds the maximum of {max_size} bytes")]
    StateTransitionMaxSizeExceeded { size: usize, max_size: usize },

    /// Signing identity does not exist.
    #[error("Identity {identity_id} not found")]
    IdentityNotFound { identity_id: Identifier },

    /// Identity has no key with the declared id.
    #[error("Public key {public_key_id} not found")]
    MissingPublicKey { public_key_id: u32 },

    /// Signature does not verify against the identity key.
    #[error("Invalid state transition signature")]
    InvalidStateTransitionSignature,
}

// =============================================================================
// APPLY ERRORS
// =============================================================================

/// Precondition violations during application. These indicate the caller
/// skipped or misordered validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    /// Create was given an existing document.
    #[error("Document {document_id} already exists")]
    DocumentAlreadyExists { document_id: Identifier },

    /// Replace or delete was given no prior document.
    #[error("Document {document_id} was not provided")]
    DocumentNotProvided { document_id: Identifier },

    /// Action code outside Create, Replace and Delete.
    #[error("Invalid document action {action}")]
    InvalidDocumentAction { action: Value },

    /// Transition references a data contract the caller did not supply.
    #[error("Data contract {data_contract_id} was not provided")]
    DataContractNotProvided { data_contract_id: Identifier },
}

// =============================================================================
// STATE REPOSITORY ERRORS
// =============================================================================

/// Infrastructure failure of the persisted-state capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateRepositoryError {
    /// Backend cannot be reached.
    #[error("State repository unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected the operation.
    #[error("State repository storage failure: {0}")]
    Storage(String),
}

// =============================================================================
// CRATE ERROR
// =============================================================================

/// Errors thrown by factories, appliers and validation pipelines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DppError {
    /// Data contract failed validation.
    #[error("Invalid data contract: {} error(s)", .errors.len())]
    InvalidDataContract {
        errors: Vec<ConsensusError>,
        raw: Value,
    },

    /// Document failed validation.
    #[error("Invalid document: {} error(s)", .errors.len())]
    InvalidDocument {
        errors: Vec<ConsensusError>,
        raw: Value,
    },

    /// State transition failed validation.
    #[error("Invalid state transition: {} error(s)", .errors.len())]
    InvalidStateTransition {
        errors: Vec<ConsensusError>,
        raw: Value,
    },

    /// Type is not defined by the data contract.
    #[error("Document type `{document_type}` is not defined in data contract {data_contract_id}")]
    InvalidDocumentType {
        document_type: String,
        data_contract_id: Identifier,
    },

    /// Batch requested with no documents.
    #[error("No documents were supplied to state transition")]
    NoDocumentsSupplied,

    /// Documents of one batch belong to different owners.
    #[error("Documents have mixed owner ids: expected {expected}, found {found}")]
    MismatchOwnerIds {
        expected: Identifier,
        found: Identifier,
    },

    /// Entity needs its creation entropy but has none.
    #[error("Entropy is missing")]
    MissingEntropy,

    /// Object does not have the expected shape.
    #[error("Malformed object: {0}")]
    MalformedObject(String),

    /// Signature key id differs from the verifying key id.
    #[error("Public key mismatch: signed with {expected}, verified with {actual}")]
    PublicKeyMismatch { expected: u32, actual: u32 },

    /// Signing key pair does not match the identity public key.
    #[error("Key pair does not match identity public key {public_key_id}")]
    InvalidSignaturePublicKey { public_key_id: u32 },

    /// Applier precondition violated.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Canonical codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Crypto primitive failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Identifier parsing failure.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Persisted-state capability failure.
    #[error(transparent)]
    StateRepository(#[from] StateRepositoryError),
}

impl DppError {
    /// Consensus errors carried by an aggregating error, empty otherwise.
    pub fn consensus_errors(&self) -> &[ConsensusError] {
        match self {
            Self::InvalidDataContract { errors, .. }
            | Self::InvalidDocument { errors, .. }
            | Self::InvalidStateTransition { errors, .. } => errors,
            _ => &[],
        }
    }
}
