//! Consensus constants. Not configurable: changing any of them forks the
//! network.

/// Data contract canonical size limit; a contract fails at this size or above.
pub const DATA_CONTRACT_MAX_BYTES: usize = 15 * 1024;

/// Generic payload and state transition canonical size limit.
pub const STATE_TRANSITION_MAX_BYTES: usize = shared_types::MAX_ENCODED_BYTES;

/// Maximum nesting of a data contract after `$ref` dereferencing.
pub const MAX_SCHEMA_DEPTH: usize = 500;

/// Unique indices allowed per document type.
pub const UNIQUE_INDEX_LIMIT: usize = 3;

/// Transitions allowed in one documents batch.
pub const MAX_TRANSITIONS_PER_BATCH: usize = 10;

/// Fee charged per byte of unsigned canonical state transition bytes.
pub const PRICE_PER_BYTE: u64 = 1;

/// Revision of a freshly created document.
pub const INITIAL_REVISION: u64 = 1;

/// Length of the entropy text form.
pub const ENTROPY_LENGTH: usize = 34;

/// Upper bound on `$ref` and nesting recursion inside the schema validator.
pub const MAX_SCHEMA_RECURSION: usize = 512;

/// Largest `$revision`, `$createdAt` or `$updatedAt` the schemas accept.
/// Every integer up to it has an exact float form.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;
