//! # DPP Core
//!
//! Document platform protocol: data contracts, documents and the state
//! transitions that register and change them.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): entities and pure rules, no I/O
//!   - `DataContract`, `Document`, `DocumentTransition`
//!   - `DocumentsBatchTransition`, `DataContractCreateTransition`
//!   - id derivation, entropy, duplicate detection, the transition applier
//!
//! - **Ports Layer** (`ports/`): capabilities the host supplies
//!   - `StateRepository`: persisted contracts, documents and identities
//!   - `JsonSchemaValidator`: draft-07 checking
//!   - `TimeSource`: wall clock for document timestamps
//!
//! - **Adapters Layer** (`adapters/`): in-crate port implementations
//!   - `DraftSchemaValidator`, `InMemoryStateRepository`, `SystemTimeSource`
//!
//! - **Validation Layer** (`validation/`): consensus validators
//! - **Factories** (`factories/`): construction from parts and wire forms
//! - **Application** (`application/`): writes validated transitions
//!
//! ## Validation Pipeline
//!
//! | Stage | Entry point | Reads state |
//! |-------|-------------|-------------|
//! | Structure | `StateTransitionValidator::validate_structure` | contracts, identities |
//! | Data | `StateTransitionValidator::validate_data` | contracts, documents |
//! | Apply | `StateTransitionApplier::apply_state_transition` | writes |
//!
//! Expected-invalid input is reported in a `ValidationResult` in a fixed
//! order; only infrastructure failures are `Err`.
//!
//! ## Usage Example
//!
//! ```ignore
//! use dpp_core::{DataContractFactory, DraftSchemaValidator, PlatformConfig};
//! use std::sync::Arc;
//!
//! let factory = DataContractFactory::new(
//!     Arc::new(DraftSchemaValidator::new()),
//!     PlatformConfig::from_env()?,
//! );
//! let contract = factory.create(owner_id, documents)?;
//! let transition = factory.create_data_contract_create_transition(contract)?;
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod factories;
pub mod ports;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use adapters::{DraftSchemaValidator, FixedTimeSource, InMemoryStateRepository, SystemTimeSource};
pub use application::StateTransitionApplier;
pub use config::{ConfigError, PlatformConfig};
pub use domain::{
    apply_document_transition, apply_to_documents, DataContract, DataContractCreateTransition,
    Document, DocumentTransition, DocumentsBatchTransition, Identity, IdentityPublicKey,
    StateTransition, StateTransitionLike, StateTransitionType, ValidationResult,
};
pub use errors::{ApplyError, ConsensusError, DppError, JsonSchemaError, StateRepositoryError};
pub use factories::{DataContractFactory, DocumentFactory, DocumentsByAction, StateTransitionFactory};
pub use ports::{DocumentQuery, JsonSchemaValidator, StateRepository, TimeSource, WhereClause};
pub use validation::{
    DataContractCreateTransitionValidator, DataContractValidator, DocumentValidator,
    DocumentsBatchBasicValidator, DocumentsBatchStateValidator, StateTransitionValidator,
};

pub use shared_types::Identifier;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
