//! Per-field configuration.

use std::fmt;
use std::sync::Arc;

use formwork_core::{FieldPath, FieldValues, Value};
use formwork_rule::{has_rules, RuleGroup, DEFAULT_TRIGGER};

use crate::instance::InstanceSink;

/// Derives the stored value from `(new value, previous value, all new values)`.
pub type NormalizeFn = Arc<dyn Fn(&Value, &Value, &FieldValues) -> Value + Send + Sync>;

/// Configuration of one registered path.
#[derive(Clone)]
pub struct FieldMeta {
    pub path: FieldPath,
    /// Event that collects the value.
    pub trigger: String,
    /// Name of the property the value is bound to (`value`, `checked`, ...).
    pub value_prop_name: String,
    pub rule_groups: Vec<RuleGroup>,
    pub initial_value: Option<Value>,
    /// Skipped by validation and group reads.
    pub hidden: bool,
    /// Survives unmounting.
    pub preserve: bool,
    /// Stop at the first violation unless the caller decides otherwise.
    pub validate_first: bool,
    pub normalize: Option<NormalizeFn>,
    pub instance_sink: Option<Arc<dyn InstanceSink>>,
}

impl FieldMeta {
    /// Empty meta for `path`.
    pub fn new(path: FieldPath) -> Self {
        Self {
            path,
            trigger: DEFAULT_TRIGGER.to_string(),
            value_prop_name: "value".to_string(),
            rule_groups: Vec::new(),
            initial_value: None,
            hidden: false,
            preserve: false,
            validate_first: false,
            normalize: None,
            instance_sink: None,
        }
    }

    /// Returns true if at least one rule group holds a rule.
    pub fn has_rules(&self) -> bool {
        has_rules(&self.rule_groups)
    }

    /// Returns true if any rule group is array-kind.
    pub fn has_array_rules(&self) -> bool {
        self.rule_groups.iter().any(RuleGroup::is_array)
    }
}

impl fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMeta")
            .field("path", &self.path)
            .field("trigger", &self.trigger)
            .field("value_prop_name", &self.value_prop_name)
            .field("rule_groups", &self.rule_groups)
            .field("initial_value", &self.initial_value)
            .field("hidden", &self.hidden)
            .field("preserve", &self.preserve)
            .field("validate_first", &self.validate_first)
            .field("normalize", &self.normalize.is_some())
            .field("instance_sink", &self.instance_sink.is_some())
            .finish()
    }
}
