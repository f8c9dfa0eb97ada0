//! Rule and rule group definitions.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ARRAY_RULE_TYPE;

/// A single declarative rule.
///
/// The rule language belongs to the engine; here a rule is its optional type
/// name, an optional message and whatever parameters the engine understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule type name (`"array"`, `"email"`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    /// Message overriding the engine's template for this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Engine-specific parameters (`required`, `pattern`, `min`, ...).
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule with a type name.
    pub fn of_type(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: Some(rule_type.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Get a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Returns true if this rule validates a whole array.
    pub fn is_array(&self) -> bool {
        self.rule_type.as_deref() == Some(ARRAY_RULE_TYPE)
    }
}

/// Whether a rule group validates a scalar or a whole array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Scalar,
    Array,
}

impl RuleKind {
    /// Array if any rule is array-typed.
    pub fn of_rules(rules: &[Rule]) -> Self {
        if rules.iter().any(Rule::is_array) {
            RuleKind::Array
        } else {
            RuleKind::Scalar
        }
    }
}

/// Ordered set of event names.
pub type TriggerSet = IndexSet<String>;

/// Trigger as written in a declaration: one event name or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerDecl {
    One(String),
    Many(Vec<String>),
}

impl TriggerDecl {
    /// Canonical set form.
    pub fn to_set(&self) -> TriggerSet {
        match self {
            TriggerDecl::One(name) => std::iter::once(name.clone()).collect(),
            TriggerDecl::Many(names) => names.iter().cloned().collect(),
        }
    }
}

impl From<&str> for TriggerDecl {
    fn from(name: &str) -> Self {
        TriggerDecl::One(name.to_string())
    }
}

impl From<Vec<&str>> for TriggerDecl {
    fn from(names: Vec<&str>) -> Self {
        TriggerDecl::Many(names.into_iter().map(str::to_string).collect())
    }
}

/// One per-field rule declaration, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerDecl>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleDecl {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            trigger: None,
            rules,
        }
    }

    pub fn on(mut self, trigger: impl Into<TriggerDecl>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }
}

/// Rules that run together on the same set of triggers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleGroup {
    pub triggers: TriggerSet,
    pub rules: Vec<Rule>,
    pub kind: RuleKind,
}

impl RuleGroup {
    /// Create a group; the kind is derived from the rules.
    pub fn new(triggers: TriggerSet, rules: Vec<Rule>) -> Self {
        let kind = RuleKind::of_rules(&rules);
        Self {
            triggers,
            rules,
            kind,
        }
    }

    /// Returns true if the group holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if `trigger` selects this group.
    pub fn fires_on(&self, trigger: &str) -> bool {
        self.triggers.contains(trigger)
    }

    pub fn is_array(&self) -> bool {
        self.kind == RuleKind::Array
    }
}
