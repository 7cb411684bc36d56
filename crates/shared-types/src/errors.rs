//! # Error Types
//!
//! Errors shared by every crate that handles identifiers or canonical bytes.

use thiserror::Error;

/// Identifier parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Byte form is not 32 bytes long.
    #[error("Invalid identifier length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    /// Text form is not 64 lowercase hex characters.
    #[error("Invalid identifier text: {0}")]
    InvalidHex(String),

    /// JSON value is not a string.
    #[error("Identifier must be a string, got {0}")]
    NotAString(String),
}

/// Canonical codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Encoded payload is larger than the permitted maximum.
    #[error("Encoded payload of {size} bytes exceeds maximum of {max_size} bytes")]
    MaxEncodedBytesReached { size: usize, max_size: usize },

    /// Encoder failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Bytes are not valid canonical CBOR.
    #[error("Decoding failed: {0}")]
    Decode(String),

    /// Decoded CBOR contains a value with no JSON-compatible form.
    #[error("Unsupported value in payload: {0}")]
    UnsupportedValue(String),
}
