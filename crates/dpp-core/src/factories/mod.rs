//! # Factories
//!
//! Construction entry points. Capabilities are passed in explicitly; no
//! factory reads global state.

pub mod data_contract;
pub mod document;
pub mod state_transition;

pub use data_contract::DataContractFactory;
pub use document::{DocumentFactory, DocumentsByAction};
pub use state_transition::StateTransitionFactory;
