//! # Validation Result
//!
//! Accumulator of consensus errors. Validity is derived from emptiness;
//! insertion order is preserved because the first reported error is part of
//! the consensus contract.

use crate::errors::ConsensusError;

/// Ordered list of consensus errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    errors: Vec<ConsensusError>,
}

impl ValidationResult {
    /// Empty (valid) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Result holding `errors`.
    #[must_use]
    pub fn with_errors(errors: Vec<ConsensusError>) -> Self {
        Self { errors }
    }

    /// Appends one error.
    pub fn add_error(&mut self, error: impl Into<ConsensusError>) {
        self.errors.push(error.into());
    }

    /// Appends several errors, keeping their order.
    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = ConsensusError>) {
        self.errors.extend(errors);
    }

    /// Appends every error of `other`.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    /// `true` when no error was reported.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in report order.
    pub fn errors(&self) -> &[ConsensusError] {
        &self.errors
    }

    /// First reported error.
    pub fn first_error(&self) -> Option<&ConsensusError> {
        self.errors.first()
    }

    /// Consumes the result.
    pub fn into_errors(self) -> Vec<ConsensusError> {
        self.errors
    }
}

impl From<ConsensusError> for ValidationResult {
    fn from(error: ConsensusError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}
