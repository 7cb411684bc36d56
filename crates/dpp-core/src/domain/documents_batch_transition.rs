//! # Documents Batch Transition
//!
//! Ordered document transitions signed by one identity. Batch order is the
//! application order. A batch may reference several data contracts.

use super::document_transition::DocumentTransition;
use super::integral;
use super::state_transition::{
    insert_signature_fields, parse_signature_fields, StateTransitionLike, StateTransitionType,
};
use crate::errors::DppError;
use serde_json::{json, Map, Value};
use shared_types::Identifier;

/// A documents batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentsBatchTransition {
    protocol_version: u32,
    owner_id: Identifier,
    transitions: Vec<DocumentTransition>,
    signature_public_key_id: Option<u32>,
    signature: Option<Vec<u8>>,
}

impl DocumentsBatchTransition {
    /// Unsigned batch.
    pub fn new(
        protocol_version: u32,
        owner_id: Identifier,
        transitions: Vec<DocumentTransition>,
    ) -> Self {
        Self {
            protocol_version,
            owner_id,
            transitions,
            signature_public_key_id: None,
            signature: None,
        }
    }

    /// Transitions in batch order.
    pub fn transitions(&self) -> &[DocumentTransition] {
        &self.transitions
    }

    /// Parses the object form. Performs no validation.
    pub fn from_object(raw: &Value) -> Result<Self, DppError> {
        let object = raw
            .as_object()
            .ok_or_else(|| DppError::MalformedObject("batch is not an object".into()))?;

        let protocol_version = object
            .get("protocolVersion")
            .and_then(integral::as_u32)
            .ok_or_else(|| DppError::MalformedObject("invalid protocolVersion".into()))?;
        let owner_id = Identifier::from_value(
            object
                .get("ownerId")
                .ok_or_else(|| DppError::MalformedObject("missing ownerId".into()))?,
        )?;
        let transitions = object
            .get("transitions")
            .and_then(Value::as_array)
            .ok_or_else(|| DppError::MalformedObject("transitions is not an array".into()))?
            .iter()
            .map(DocumentTransition::from_object)
            .collect::<Result<Vec<_>, _>>()?;
        let (signature_public_key_id, signature) = parse_signature_fields(object)?;

        Ok(Self {
            protocol_version,
            owner_id,
            transitions,
            signature_public_key_id,
            signature,
        })
    }
}

impl StateTransitionLike for DocumentsBatchTransition {
    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::DocumentsBatch
    }

    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn owner_id(&self) -> Identifier {
        self.owner_id
    }

    fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    fn signature_public_key_id(&self) -> Option<u32> {
        self.signature_public_key_id
    }

    fn set_signature(&mut self, public_key_id: u32, signature: Vec<u8>) {
        self.signature_public_key_id = Some(public_key_id);
        self.signature = Some(signature);
    }

    fn to_object(&self, skip_signature: bool) -> Value {
        let mut object = Map::new();
        object.insert("protocolVersion".into(), json!(self.protocol_version));
        object.insert("type".into(), json!(self.transition_type().code()));
        object.insert("ownerId".into(), self.owner_id.to_value());
        object.insert(
            "transitions".into(),
            Value::Array(
                self.transitions
                    .iter()
                    .map(DocumentTransition::to_object)
                    .collect(),
            ),
        );
        insert_signature_fields(
            &mut object,
            skip_signature,
            self.signature_public_key_id,
            self.signature.as_deref(),
        );
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document_transition::DocumentDeleteTransition;
    use crate::domain::identity::IdentityPublicKey;
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::codec;

    fn batch() -> DocumentsBatchTransition {
        DocumentsBatchTransition::new(
            0,
            Identifier::new([4u8; 32]),
            vec![DocumentTransition::Delete(DocumentDeleteTransition {
                id: Identifier::new([5u8; 32]),
                document_type: "note".into(),
                data_contract_id: Identifier::new([6u8; 32]),
            })],
        )
    }

    #[test]
    fn test_sign_and_verify() {
        let key_pair = Secp256k1KeyPair::generate();
        let key = IdentityPublicKey::from_key_pair(1, &key_pair);
        let mut batch = batch();

        assert!(!batch.verify_signature(&key).unwrap());
        batch.sign(&key, &key_pair).unwrap();

        assert_eq!(batch.signature_public_key_id(), Some(1));
        assert!(batch.verify_signature(&key).unwrap());
    }

    #[test]
    fn test_tampering_breaks_signature() {
        let key_pair = Secp256k1KeyPair::generate();
        let key = IdentityPublicKey::from_key_pair(1, &key_pair);
        let mut batch = batch();
        batch.sign(&key, &key_pair).unwrap();

        let mut raw = batch.to_object(false);
        raw["protocolVersion"] = json!(7);
        let tampered = DocumentsBatchTransition::from_object(&raw).unwrap();

        assert!(!tampered.verify_signature(&key).unwrap());
    }

    #[test]
    fn test_sign_with_foreign_key_pair_rejected() {
        let key = IdentityPublicKey::from_key_pair(1, &Secp256k1KeyPair::generate());
        let mut batch = batch();

        assert_eq!(
            batch.sign(&key, &Secp256k1KeyPair::generate()),
            Err(DppError::InvalidSignaturePublicKey { public_key_id: 1 })
        );
    }

    #[test]
    fn test_verify_with_other_key_id_is_mismatch() {
        let key_pair = Secp256k1KeyPair::generate();
        let mut batch = batch();
        batch
            .sign(&IdentityPublicKey::from_key_pair(1, &key_pair), &key_pair)
            .unwrap();

        let other = IdentityPublicKey::from_key_pair(2, &key_pair);
        assert_eq!(
            batch.verify_signature(&other),
            Err(DppError::PublicKeyMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_fee_is_unsigned_size() {
        let key_pair = Secp256k1KeyPair::generate();
        let mut batch = batch();
        let unsigned_size = batch.to_buffer(true).unwrap().len() as u64;
        batch
            .sign(&IdentityPublicKey::from_key_pair(1, &key_pair), &key_pair)
            .unwrap();

        assert_eq!(batch.calculate_fee().unwrap(), unsigned_size);
        assert!(batch.to_buffer(false).unwrap().len() as u64 > unsigned_size);
    }

    #[test]
    fn test_object_roundtrip() {
        let key_pair = Secp256k1KeyPair::generate();
        let mut batch = batch();
        batch
            .sign(&IdentityPublicKey::from_key_pair(1, &key_pair), &key_pair)
            .unwrap();

        let bytes = batch.to_buffer(false).unwrap();
        let restored =
            DocumentsBatchTransition::from_object(&codec::decode(&bytes).unwrap()).unwrap();

        assert_eq!(restored, batch);
        assert_eq!(restored.hash().unwrap(), batch.hash().unwrap());
    }

    #[test]
    fn test_skip_signature_drops_fields() {
        let key_pair = Secp256k1KeyPair::generate();
        let mut batch = batch();
        batch
            .sign(&IdentityPublicKey::from_key_pair(1, &key_pair), &key_pair)
            .unwrap();

        let unsigned = batch.to_object(true);
        assert!(unsigned.get("signature").is_none());
        assert!(unsigned.get("signaturePublicKeyId").is_none());
        assert_eq!(batch.to_object(false)["type"], 1);
    }
}
