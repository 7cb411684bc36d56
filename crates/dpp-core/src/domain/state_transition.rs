//! # State Transitions
//!
//! Closed set of signed ledger mutations handled by this crate. Shared
//! behaviour (canonical bytes, hash, fee, sign, verify) lives on
//! [`StateTransitionLike`]; each kind only supplies its object form and
//! signature fields.

use super::data_contract_create_transition::DataContractCreateTransition;
use super::documents_batch_transition::DocumentsBatchTransition;
use super::identity::{IdentityPublicKey, KeyType};
use super::integral;
use super::limits::PRICE_PER_BYTE;
use crate::errors::DppError;
use serde_json::Value;
use shared_crypto::{sha256d, Hash, Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
use shared_types::{codec, Identifier};

/// State transition type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateTransitionType {
    /// Registers a data contract.
    DataContractCreate,
    /// Creates, replaces and deletes documents.
    DocumentsBatch,
}

impl StateTransitionType {
    /// Wire code.
    pub const fn code(self) -> u64 {
        match self {
            Self::DataContractCreate => 0,
            Self::DocumentsBatch => 1,
        }
    }

    /// Parses a wire code.
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::DataContractCreate),
            1 => Some(Self::DocumentsBatch),
            _ => None,
        }
    }
}

/// Behaviour shared by every state transition kind.
pub trait StateTransitionLike {
    /// Type code.
    fn transition_type(&self) -> StateTransitionType;

    /// Protocol version the transition was built for.
    fn protocol_version(&self) -> u32;

    /// Identity that signs the transition.
    fn owner_id(&self) -> Identifier;

    /// Signature bytes, if signed.
    fn signature(&self) -> Option<&[u8]>;

    /// Id of the identity key the signature was made with.
    fn signature_public_key_id(&self) -> Option<u32>;

    /// Stores a signature and its key id.
    fn set_signature(&mut self, public_key_id: u32, signature: Vec<u8>);

    /// Object form; `skip_signature` drops `signature` and
    /// `signaturePublicKeyId`.
    fn to_object(&self, skip_signature: bool) -> Value;

    /// Canonical bytes, limited to the generic payload size.
    fn to_buffer(&self, skip_signature: bool) -> Result<Vec<u8>, DppError> {
        Ok(codec::encode(&self.to_object(skip_signature))?)
    }

    /// Double SHA-256 of the signed canonical bytes.
    fn hash(&self) -> Result<Hash, DppError> {
        Ok(sha256d(&self.to_buffer(false)?))
    }

    /// Byte length of the unsigned canonical bytes times the price per byte.
    fn calculate_fee(&self) -> Result<u64, DppError> {
        let size = self.to_buffer(true)?.len() as u64;
        Ok(size * PRICE_PER_BYTE)
    }

    /// Signs the unsigned canonical bytes with `key_pair`, which must match
    /// `identity_public_key`.
    fn sign(
        &mut self,
        identity_public_key: &IdentityPublicKey,
        key_pair: &Secp256k1KeyPair,
    ) -> Result<(), DppError> {
        match identity_public_key.key_type() {
            KeyType::EcdsaSecp256k1 => {
                if key_pair.public_key().as_bytes().as_slice() != identity_public_key.data() {
                    return Err(DppError::InvalidSignaturePublicKey {
                        public_key_id: identity_public_key.id(),
                    });
                }
                let signature = key_pair.sign(&self.to_buffer(true)?);
                self.set_signature(identity_public_key.id(), signature.to_vec());
                Ok(())
            }
        }
    }

    /// Verifies the signature against `identity_public_key`.
    ///
    /// `Ok(false)` when unsigned or when the signature does not verify;
    /// `Err(PublicKeyMismatch)` when signed with a different key id.
    fn verify_signature(&self, identity_public_key: &IdentityPublicKey) -> Result<bool, DppError> {
        let (Some(signature), Some(key_id)) = (self.signature(), self.signature_public_key_id())
        else {
            return Ok(false);
        };
        if key_id != identity_public_key.id() {
            return Err(DppError::PublicKeyMismatch {
                expected: key_id,
                actual: identity_public_key.id(),
            });
        }

        match identity_public_key.key_type() {
            KeyType::EcdsaSecp256k1 => {
                let public_key = Secp256k1PublicKey::from_slice(identity_public_key.data())?;
                let Ok(signature) = Secp256k1Signature::from_slice(signature) else {
                    return Ok(false);
                };
                let message = self.to_buffer(true)?;
                Ok(public_key.verify(&message, &signature).is_ok())
            }
        }
    }
}

/// A state transition of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum StateTransition {
    /// Data contract registration.
    DataContractCreate(DataContractCreateTransition),
    /// Documents batch.
    DocumentsBatch(DocumentsBatchTransition),
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            StateTransition::DataContractCreate($inner) => $body,
            StateTransition::DocumentsBatch($inner) => $body,
        }
    };
}

impl StateTransitionLike for StateTransition {
    fn transition_type(&self) -> StateTransitionType {
        delegate!(self, inner => inner.transition_type())
    }

    fn protocol_version(&self) -> u32 {
        delegate!(self, inner => inner.protocol_version())
    }

    fn owner_id(&self) -> Identifier {
        delegate!(self, inner => inner.owner_id())
    }

    fn signature(&self) -> Option<&[u8]> {
        delegate!(self, inner => inner.signature())
    }

    fn signature_public_key_id(&self) -> Option<u32> {
        delegate!(self, inner => inner.signature_public_key_id())
    }

    fn set_signature(&mut self, public_key_id: u32, signature: Vec<u8>) {
        delegate!(self, inner => inner.set_signature(public_key_id, signature))
    }

    fn to_object(&self, skip_signature: bool) -> Value {
        delegate!(self, inner => inner.to_object(skip_signature))
    }
}

impl From<DataContractCreateTransition> for StateTransition {
    fn from(transition: DataContractCreateTransition) -> Self {
        Self::DataContractCreate(transition)
    }
}

impl From<DocumentsBatchTransition> for StateTransition {
    fn from(transition: DocumentsBatchTransition) -> Self {
        Self::DocumentsBatch(transition)
    }
}

impl StateTransition {
    /// Parses the object form, dispatching on `type`. Performs no
    /// validation.
    pub fn from_object(raw: &Value) -> Result<Self, DppError> {
        let code = raw
            .get("type")
            .and_then(integral::as_u64)
            .ok_or_else(|| DppError::MalformedObject("missing state transition type".into()))?;

        match StateTransitionType::from_code(code) {
            Some(StateTransitionType::DataContractCreate) => {
                Ok(DataContractCreateTransition::from_object(raw)?.into())
            }
            Some(StateTransitionType::DocumentsBatch) => {
                Ok(DocumentsBatchTransition::from_object(raw)?.into())
            }
            None => Err(DppError::MalformedObject(format!(
                "unknown state transition type {code}"
            ))),
        }
    }
}

/// Optional signature fields shared by every kind's object form.
pub(crate) fn insert_signature_fields(
    object: &mut serde_json::Map<String, Value>,
    skip_signature: bool,
    public_key_id: Option<u32>,
    signature: Option<&[u8]>,
) {
    if skip_signature {
        return;
    }
    if let Some(public_key_id) = public_key_id {
        object.insert("signaturePublicKeyId".into(), Value::from(public_key_id));
    }
    if let Some(signature) = signature {
        object.insert("signature".into(), Value::String(hex::encode(signature)));
    }
}

/// Reads the optional signature fields of an object form.
pub(crate) fn parse_signature_fields(
    object: &serde_json::Map<String, Value>,
) -> Result<(Option<u32>, Option<Vec<u8>>), DppError> {
    let public_key_id = match object.get("signaturePublicKeyId") {
        None => None,
        Some(value) => Some(
            integral::as_u32(value)
                .ok_or_else(|| DppError::MalformedObject("invalid signaturePublicKeyId".into()))?,
        ),
    };
    let signature = match object.get("signature") {
        None => None,
        Some(value) => Some(
            value
                .as_str()
                .and_then(|text| hex::decode(text).ok())
                .ok_or_else(|| DppError::MalformedObject("invalid signature".into()))?,
        ),
    };
    Ok((public_key_id, signature))
}
