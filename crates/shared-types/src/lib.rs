//! # Shared Types Crate
//!
//! Types whose byte layout every node must reproduce exactly.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Identifier` is the only id type; its text
//!   form (64 lowercase hex characters) appears in every object form.
//! - **Canonical Bytes**: `codec::encode` is the only way entities turn into
//!   bytes for hashing, signing, fee calculation and size limits.

pub mod codec;
pub mod errors;
pub mod identifier;

pub use codec::{decode, encode, encode_unbounded, MAX_ENCODED_BYTES};
pub use errors::*;
pub use identifier::Identifier;
