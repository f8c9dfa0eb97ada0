//! Validation error types.

use formwork_core::FieldPath;
use formwork_rule::EngineError;
use thiserror::Error;

/// Result type for validation passes.
pub type ValidateResult<T> = Result<T, ValidateError>;

/// Errors that abort a validation pass.
///
/// Rule failures are not errors; they are reported in the outcome's
/// [`ErrorTree`](crate::ErrorTree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Cannot validate unregistered field: {path}")]
    UnregisteredField { path: FieldPath },
}

impl ValidateError {
    pub fn unregistered_field(path: FieldPath) -> Self {
        Self::UnregisteredField { path }
    }
}
