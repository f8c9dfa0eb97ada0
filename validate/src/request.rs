//! Inputs and outputs of a validation pass.

use formwork_core::{FieldPath, Value};
use formwork_rule::FirstFields;

use crate::tree::ErrorTree;

/// Caller options of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Validate fields that are not dirty instead of reusing their errors.
    pub force: bool,
    /// `None` lets the engine run every rule.
    pub first_fields: Option<FirstFields>,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn first_fields(mut self, first_fields: impl Into<FirstFields>) -> Self {
        self.first_fields = Some(first_fields.into());
        self
    }
}

/// One validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationRequest {
    /// Full paths considered by the pass.
    pub fields: Vec<FieldPath>,
    /// Trigger selecting the rule groups; `None` runs every group.
    pub action: Option<String>,
    /// Names whose values are projected into the outcome; `None` means all.
    pub field_names: Option<Vec<FieldPath>>,
    pub options: ValidateOptions,
}

impl ValidationRequest {
    pub fn new(fields: Vec<FieldPath>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn field_names(mut self, names: Vec<FieldPath>) -> Self {
        self.field_names = Some(names);
        self
    }

    pub fn options(mut self, options: ValidateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of a completed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// `None` when nothing failed.
    pub errors: Option<ErrorTree>,
    /// Nested values of the requested names at completion.
    pub values: Value,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_none()
    }
}
