//! Per-field runtime state.

use formwork_core::{FieldPath, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A rule failure attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Path the failure was reported for (may be an element of the field).
    pub field: FieldPath,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: FieldPath, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Collected state of one registered path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    /// Explicit value; `None` falls back to the meta's initial value.
    pub value: Option<Value>,
    pub errors: Option<Vec<ValidationError>>,
    /// Changed since the last committed validation outcome.
    ///
    /// `None` until a pass or a collection first decides; only `Some(false)`
    /// lets a validation pass skip the field.
    pub dirty: Option<bool>,
    pub touched: bool,
    pub validating: bool,
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty == Some(true)
    }

    /// Returns true if the last committed outcome still holds for the value.
    pub fn is_clean(&self) -> bool {
        self.dirty == Some(false)
    }

    /// Error messages, `None` when the field has no error list.
    pub fn error_messages(&self) -> Option<Vec<String>> {
        self.errors
            .as_ref()
            .map(|errors| errors.iter().map(|e| e.message.clone()).collect())
    }

    /// JSON snapshot used for nested field projections.
    pub fn to_json(&self, name: &FieldPath) -> Value {
        let mut out = json!({
            "name": name.to_string(),
            "dirty": self.is_dirty(),
            "touched": self.touched,
            "validating": self.validating,
        });
        if let Value::Object(map) = &mut out {
            if let Some(value) = &self.value {
                map.insert("value".into(), value.clone());
            }
            if let Some(errors) = &self.errors {
                map.insert(
                    "errors".into(),
                    errors.iter().map(|e| json!({"field": e.field.to_string(), "message": e.message})).collect(),
                );
            }
        }
        out
    }
}

/// Sparse set of whole-field replacements, keyed by full path.
pub type FieldPatch = IndexMap<FieldPath, Field>;
