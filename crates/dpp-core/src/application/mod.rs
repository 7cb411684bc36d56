//! # Application
//!
//! Writes validated state transitions into the repository.

pub mod apply;

pub use apply::StateTransitionApplier;
