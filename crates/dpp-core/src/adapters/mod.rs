//! # Adapters
//!
//! Implementations of the outbound ports.
//!
//! - `clock`: system and fixed [`TimeSource`](crate::ports::TimeSource)
//! - `json_schema`: draft-07 [`JsonSchemaValidator`](crate::ports::JsonSchemaValidator)
//! - `memory_repository`: in-memory [`StateRepository`](crate::ports::StateRepository)

pub mod clock;
pub mod json_schema;
pub mod memory_repository;

pub use clock::{FixedTimeSource, SystemTimeSource};
pub use json_schema::DraftSchemaValidator;
pub use memory_repository::InMemoryStateRepository;
