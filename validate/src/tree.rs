//! Error trees produced by validation passes.

use formwork_core::nested;
use formwork_core::{FieldPath, Value};
use formwork_registry::ValidationError;
use indexmap::IndexMap;
use serde_json::{json, Map};

/// Message reported for a field whose value changed during its pass.
pub fn expired_message(path: &FieldPath) -> String {
    format!("{} need to revalidate", path)
}

/// Errors grouped under one owning path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub errors: Vec<ValidationError>,
    /// The field's value changed while it was being validated.
    pub expired: bool,
}

impl FieldErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self {
            errors,
            expired: false,
        }
    }

    /// Marker entry for a result that was discarded as stale.
    pub fn expired(path: &FieldPath) -> Self {
        Self {
            errors: vec![ValidationError::new(path.clone(), expired_message(path))],
            expired: true,
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    fn to_json(&self) -> Value {
        let errors: Vec<Value> = self
            .errors
            .iter()
            .map(|e| json!({"field": e.field.to_string(), "message": e.message}))
            .collect();
        let mut out = Map::new();
        if self.expired {
            out.insert("expired".into(), Value::Bool(true));
        }
        out.insert("errors".into(), Value::Array(errors));
        Value::Object(out)
    }
}

/// Errors of one validation pass, keyed by owning path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTree {
    entries: IndexMap<FieldPath, FieldErrors>,
}

impl ErrorTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one error under `owner`.
    pub fn push(&mut self, owner: FieldPath, error: ValidationError) {
        self.entries.entry(owner).or_default().errors.push(error);
    }

    /// Replace the entry of `path`.
    pub fn set(&mut self, path: FieldPath, errors: FieldErrors) {
        self.entries.insert(path, errors);
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldErrors> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldErrors)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.entries.keys()
    }

    /// Paths whose results were discarded as stale.
    pub fn expired_paths(&self) -> Vec<&FieldPath> {
        self.entries
            .iter()
            .filter(|(_, e)| e.expired)
            .map(|(p, _)| p)
            .collect()
    }

    /// Nested form: `{path: {errors: [{field, message}], expired?}}`.
    pub fn to_nested(&self) -> Value {
        nested::build(self.entries.iter().map(|(path, errors)| (path, errors.to_json())))
    }
}
