//! Formwork Rule
//!
//! Declarative validation rules and the seam to the engine that evaluates them.
//!
//! Responsibilities:
//! - Model rules, rule groups and their trigger sets
//! - Normalize per-field and form-level declarations into rule groups
//! - Answer which events bind validation and which rules an event selects
//! - Define the request/response contract of the external rule engine

mod engine;
mod error;
mod normalize;
mod rule;

pub use engine::{EngineRequest, FirstFields, MessageCatalog, RawViolation, RuleEngine};
pub use error::{EngineError, EngineResult};
pub use normalize::{has_rules, normalize, rules_for, triggers_of};
pub use rule::{Rule, RuleDecl, RuleGroup, RuleKind, TriggerDecl, TriggerSet};

/// Event that collects a field's value when no trigger is configured.
pub const DEFAULT_TRIGGER: &str = "onChange";

/// Rule type that marks a group as array-kind.
pub const ARRAY_RULE_TYPE: &str = "array";
