//! Form error types.

use formwork_core::Value;
use formwork_validate::{ErrorTree, ValidateError};
use thiserror::Error;

/// Result type for form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Rejection of a whole-form validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub errors: ErrorTree,
    /// Values of the validated names at completion.
    pub values: Value,
}

/// Errors returned by form operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Structural misuse: {message}")]
    StructuralMisuse { message: String },

    #[error("Validation failed for {} field(s)", .0.errors.len())]
    ValidationFailed(ValidationFailure),

    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl FormError {
    pub fn structural_misuse(message: impl Into<String>) -> Self {
        Self::StructuralMisuse {
            message: message.into(),
        }
    }

    /// The failure, if this error is a rejected validation.
    pub fn as_failure(&self) -> Option<&ValidationFailure> {
        match self {
            FormError::ValidationFailed(failure) => Some(failure),
            _ => None,
        }
    }
}
