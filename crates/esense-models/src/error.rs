//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Raised when a value received from the service violates a model invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Percent confidence out of range (0-100): {0}")]
    PercentOutOfRange(f64),

    #[error("Fraction out of range (0-1): {0}")]
    FractionOutOfRange(f64),
}
