//! Rule engine error types.

use thiserror::Error;

/// Result type for rule engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// Structural faults raised by a rule engine.
///
/// Ordinary rule failures are not errors; engines report them as violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Rule engine failed: {message}")]
    Failed { message: String },
}

impl EngineError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
