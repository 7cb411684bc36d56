//! # Shared Crypto - Hash and Signature Primitives
//!
//! Black-box primitives consumed by the document platform.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | double SHA-256 | Identifier derivation, entity hashes |
//! | `ecdsa` | secp256k1 | State transition signing |
//!
//! Any change to these functions changes every derived identifier on the
//! ledger.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256d, sha256d_many, Hash, Sha256dHasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
