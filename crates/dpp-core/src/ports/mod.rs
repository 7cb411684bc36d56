//! # Ports
//!
//! Capabilities this crate requires from its host.

pub mod outbound;

pub use outbound::{DocumentQuery, JsonSchemaValidator, StateRepository, TimeSource, WhereClause};
