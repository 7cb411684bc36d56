//! # ECDSA Signatures (secp256k1)
//!
//! Signing capability for state transitions. The signed message is always
//! the canonical byte encoding of a transition with its signature fields
//! omitted; this module only sees opaque bytes.
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Compressed 33-byte public keys, 64-byte `r||s` signatures

use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use zeroize::Zeroize;

/// Length of a compressed SEC1 public key.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Length of an `r||s` signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl Secp256k1PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        VerifyingKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;

        let mut key = [0u8; PUBLIC_KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Verify `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Secp256k1Signature) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig = Signature::from_slice(&signature.0)
            .map_err(|_| CryptoError::InvalidSignature(SIGNATURE_LENGTH))?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// ECDSA signature (64 bytes, r||s format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1Signature([u8; SIGNATURE_LENGTH]);

impl Secp256k1Signature {
    /// Create from a byte slice; must be exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoError::InvalidSignature(bytes.len()));
        }
        let mut sig = [0u8; SIGNATURE_LENGTH];
        sig.copy_from_slice(bytes);
        Ok(Self(sig))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Owned byte vector, as carried on the wire.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// secp256k1 ECDSA keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let verifying_key = self.signing_key.verifying_key();
        let sec1_bytes = verifying_key.to_sec1_bytes();
        // SEC1 compressed encoding is always 33 bytes
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(&sec1_bytes[..PUBLIC_KEY_LENGTH]);
        Secp256k1PublicKey(bytes)
    }

    /// Sign a message (deterministic RFC 6979).
    pub fn sign(&self, message: &[u8]) -> Secp256k1Signature {
        let sig: Signature = self.signing_key.sign(message);
        let bytes: [u8; SIGNATURE_LENGTH] = sig.to_bytes().into();
        Secp256k1Signature(bytes)
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}
