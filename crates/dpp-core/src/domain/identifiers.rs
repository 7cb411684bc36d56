//! # Identifier Derivation
//!
//! Ids are pure functions of their inputs, concatenated in this byte order:
//!
//! | Entity | Preimage |
//! |--------|----------|
//! | Data contract | `ownerId ‖ entropy` |
//! | Document | `contractId ‖ ownerId ‖ utf8(type) ‖ entropy` |
//!
//! `entropy` is the decoded entropy bytes; the hash is double SHA-256.

use shared_crypto::sha256d_many;
use shared_types::Identifier;

/// Derives a data contract id.
pub fn generate_data_contract_id(owner_id: &Identifier, entropy: &[u8]) -> Identifier {
    Identifier::new(sha256d_many(&[owner_id.as_bytes(), entropy]))
}

/// Derives a document id.
pub fn generate_document_id(
    data_contract_id: &Identifier,
    owner_id: &Identifier,
    document_type: &str,
    entropy: &[u8],
) -> Identifier {
    Identifier::new(sha256d_many(&[
        data_contract_id.as_bytes(),
        owner_id.as_bytes(),
        document_type.as_bytes(),
        entropy,
    ]))
}
