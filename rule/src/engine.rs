//! Contract of the external rule engine.

use async_trait::async_trait;
use formwork_core::{FieldPath, FieldValues};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::rule::Rule;

/// Message templates keyed by rule kind (`"required"`, `"string.len"`, ...).
///
/// A catalog supplied by the host overrides the engine's defaults for one
/// validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    templates: IndexMap<String, String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(kind.into(), template.into());
        self
    }

    /// Get the template for a rule kind.
    pub fn get(&self, kind: &str) -> Option<&str> {
        self.templates.get(kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Which fields stop at their first violation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FirstFields {
    /// Every rule of every field runs.
    #[default]
    None,
    /// Every field stops at its first violation.
    All,
    /// Only the listed fields stop at their first violation.
    Only(Vec<FieldPath>),
}

impl FirstFields {
    /// Returns true if `path` should stop at its first violation.
    pub fn applies_to(&self, path: &FieldPath) -> bool {
        match self {
            FirstFields::None => false,
            FirstFields::All => true,
            FirstFields::Only(paths) => paths.contains(path),
        }
    }
}

impl From<bool> for FirstFields {
    fn from(all: bool) -> Self {
        if all {
            FirstFields::All
        } else {
            FirstFields::None
        }
    }
}

/// One engine invocation.
#[derive(Debug, Clone, Default)]
pub struct EngineRequest {
    /// Rules per field path.
    pub rules: IndexMap<FieldPath, Vec<Rule>>,
    /// Value per field path, as snapshotted for this pass.
    pub values: FieldValues,
    /// Templates overriding the engine defaults.
    pub messages: Option<MessageCatalog>,
    pub first_fields: FirstFields,
}

/// A failed rule as reported by the engine.
///
/// `field` may address a position inside the validated value (`list.1`) when
/// an array rule reports per-element problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawViolation {
    pub field: FieldPath,
    pub message: String,
}

impl RawViolation {
    pub fn new(field: FieldPath, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Evaluates rules against values.
///
/// Engines report rule failures as violations and reserve `Err` for
/// structural faults, which the caller does not catch.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    async fn validate(&self, request: EngineRequest) -> EngineResult<Vec<RawViolation>>;
}
