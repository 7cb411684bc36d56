//! Builders shared by unit tests and the cross-crate test suite.

use crate::adapters::{DraftSchemaValidator, FixedTimeSource, InMemoryStateRepository};
use crate::config::PlatformConfig;
use crate::domain::data_contract::DataContract;
use crate::domain::entropy;
use crate::domain::identity::{Identity, IdentityPublicKey};
use crate::factories::{DataContractFactory, DocumentFactory, StateTransitionFactory};
use crate::validation::StateTransitionValidator;
use serde_json::{json, Map, Value};
use shared_crypto::Secp256k1KeyPair;
use shared_types::Identifier;
use std::sync::Arc;

/// Owner of the sample contract.
pub const FIXTURE_OWNER: Identifier = Identifier::new([0x11; 32]);

/// Fixed document timestamp.
pub const FIXTURE_NOW: u64 = 1_700_000_000_000;

/// Document types of the sample contract: `note` with a unique
/// `($ownerId, title)` index, and an unindexed `tag`.
pub fn note_documents() -> Map<String, Value> {
    let documents = json!({
        "note": {
            "type": "object",
            "properties": {
                "title": { "type": "string", "maxLength": 63 },
                "body": { "type": "string" },
                "cover": { "type": "string", "contentEncoding": "base64" }
            },
            "required": ["title"],
            "indices": [
                { "properties": [{ "$ownerId": "asc" }, { "title": "asc" }], "unique": true }
            ],
            "additionalProperties": false
        },
        "tag": {
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "additionalProperties": false
        }
    });
    match documents {
        Value::Object(documents) => documents,
        _ => Map::new(),
    }
}

/// Fresh sample contract owned by `owner_id`.
pub fn note_contract(owner_id: Identifier) -> DataContract {
    match DataContract::new(0, owner_id, note_documents(), entropy::generate()) {
        Ok(data_contract) => data_contract,
        Err(error) => panic!("sample contract: {error}"),
    }
}

/// An identity with one secp256k1 key, id 0.
pub struct FixtureIdentity {
    /// The identity as stored.
    pub identity: Identity,
    /// Its only public key.
    pub public_key: IdentityPublicKey,
    /// Signing half of `public_key`.
    pub key_pair: Secp256k1KeyPair,
}

/// Identity `id` with a fresh key pair.
pub fn identity(id: Identifier) -> FixtureIdentity {
    let key_pair = Secp256k1KeyPair::generate();
    let public_key = IdentityPublicKey::from_key_pair(0, &key_pair);
    FixtureIdentity {
        identity: Identity::new(id, vec![public_key.clone()], 10_000),
        public_key,
        key_pair,
    }
}

/// Everything a pipeline test needs, wired around one in-memory store.
pub struct Platform {
    /// Shared store.
    pub repository: Arc<InMemoryStateRepository>,
    /// Contract factory.
    pub data_contracts: DataContractFactory<DraftSchemaValidator>,
    /// Document factory on a fixed clock.
    pub documents: DocumentFactory<DraftSchemaValidator, InMemoryStateRepository, FixedTimeSource>,
    /// State transition factory.
    pub state_transitions: StateTransitionFactory<DraftSchemaValidator, InMemoryStateRepository>,
    /// State transition validator.
    pub validator: StateTransitionValidator<DraftSchemaValidator, InMemoryStateRepository>,
}

/// Wires a [`Platform`] over an empty store with `config`.
pub fn platform(config: PlatformConfig) -> Platform {
    let schema_validator = Arc::new(DraftSchemaValidator::new());
    let repository = Arc::new(InMemoryStateRepository::new());
    Platform {
        data_contracts: DataContractFactory::new(Arc::clone(&schema_validator), config.clone()),
        documents: DocumentFactory::new(
            Arc::clone(&schema_validator),
            Arc::clone(&repository),
            Arc::new(FixedTimeSource(FIXTURE_NOW)),
            &config,
        ),
        state_transitions: StateTransitionFactory::new(
            Arc::clone(&schema_validator),
            Arc::clone(&repository),
            config.clone(),
        ),
        validator: StateTransitionValidator::new(schema_validator, Arc::clone(&repository), config),
        repository,
    }
}
