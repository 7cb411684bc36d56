//! # Identifier
//!
//! 32-byte identifier used for identities, data contracts and documents.
//! The text form is 64 lowercase hex characters; it is the form used in
//! every object representation and therefore in canonical bytes.

use crate::errors::IdentifierError;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 32-byte identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier(pub [u8; 32]);

impl Identifier {
    /// Identifier length in bytes.
    pub const LENGTH: usize = 32;

    /// Length of the hex text form.
    pub const HEX_LENGTH: usize = 64;

    /// Creates an identifier from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Random identifier (test setup, identity creation outside this crate).
    #[must_use]
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Creates an identifier from a slice of exactly 32 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, IdentifierError> {
        if slice.len() != Self::LENGTH {
            return Err(IdentifierError::InvalidLength(slice.len()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Parses the 64-character lowercase hex form.
    pub fn from_hex(text: &str) -> Result<Self, IdentifierError> {
        if text.len() != Self::HEX_LENGTH
            || !text.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(IdentifierError::InvalidHex(text.to_string()));
        }
        let bytes = hex::decode(text).map_err(|_| IdentifierError::InvalidHex(text.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Lowercase hex text form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The identifier as a JSON string value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_hex())
    }

    /// Reads an identifier from a JSON value holding the hex text form.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, IdentifierError> {
        match value {
            serde_json::Value::String(text) => Self::from_hex(text),
            other => Err(IdentifierError::NotAString(other.to_string())),
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Identifier {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Identifier> for [u8; 32] {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
