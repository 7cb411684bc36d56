//! # Identity
//!
//! The slice of an identity the document platform consumes: its id and the
//! public keys state transitions are signed with. Identity creation and
//! top-up happen elsewhere.

use serde::{Deserialize, Serialize};
use shared_crypto::Secp256k1KeyPair;
use shared_types::Identifier;

/// Supported key types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Compressed secp256k1 public key, ECDSA signatures.
    EcdsaSecp256k1,
}

/// A public key registered on an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPublicKey {
    id: u32,
    key_type: KeyType,
    data: Vec<u8>,
}

impl IdentityPublicKey {
    /// Creates a key entry.
    pub fn new(id: u32, key_type: KeyType, data: Vec<u8>) -> Self {
        Self { id, key_type, data }
    }

    /// Key entry for the public half of `key_pair`.
    pub fn from_key_pair(id: u32, key_pair: &Secp256k1KeyPair) -> Self {
        Self::new(
            id,
            KeyType::EcdsaSecp256k1,
            key_pair.public_key().as_bytes().to_vec(),
        )
    }

    /// Key id, referenced by `signaturePublicKeyId`.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Key type.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Raw public key bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// An identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: Identifier,
    public_keys: Vec<IdentityPublicKey>,
    balance: u64,
}

impl Identity {
    /// Creates an identity.
    pub fn new(id: Identifier, public_keys: Vec<IdentityPublicKey>, balance: u64) -> Self {
        Self {
            id,
            public_keys,
            balance,
        }
    }

    /// Identity id.
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// Registered public keys.
    pub fn public_keys(&self) -> &[IdentityPublicKey] {
        &self.public_keys
    }

    /// Credit balance.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Key with `id`, if registered.
    pub fn get_public_key_by_id(&self, id: u32) -> Option<&IdentityPublicKey> {
        self.public_keys.iter().find(|key| key.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lookup() {
        let key_pair = Secp256k1KeyPair::generate();
        let identity = Identity::new(
            Identifier::new([1u8; 32]),
            vec![IdentityPublicKey::from_key_pair(3, &key_pair)],
            0,
        );

        let key = identity.get_public_key_by_id(3).unwrap();
        assert_eq!(key.data(), key_pair.public_key().as_bytes());
        assert!(identity.get_public_key_by_id(0).is_none());
    }
}
