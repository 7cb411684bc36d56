//! End-to-end scenarios.

pub mod data_contracts;
pub mod documents_batch;
pub mod lifecycle;
