//! Form and field configuration.

use std::fmt;
use std::sync::Arc;

use formwork_core::{FieldValues, Value};
use formwork_registry::{FieldMeta, InstanceSink, NormalizeFn};
use formwork_rule::{normalize, MessageCatalog, Rule, RuleDecl, TriggerDecl, TriggerSet, DEFAULT_TRIGGER};
use serde::{Deserialize, Serialize};

/// Form-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormOptions {
    /// Prefix of binding ids (`<name>_<path>`).
    pub name: Option<String>,
    /// Collect event of fields that do not name one.
    pub default_trigger: String,
    /// Templates passed to the rule engine on every pass.
    pub validate_messages: Option<MessageCatalog>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            name: None,
            default_trigger: DEFAULT_TRIGGER.to_string(),
            validate_messages: None,
        }
    }
}

impl FormOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.default_trigger = trigger.into();
        self
    }

    pub fn validate_messages(mut self, messages: MessageCatalog) -> Self {
        self.validate_messages = Some(messages);
        self
    }
}

/// Options of one field registration.
///
/// Unset options keep what an earlier registration of the same path stored,
/// except `trigger` and `value_prop_name`, which fall back to their defaults.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldOptions {
    pub trigger: Option<String>,
    /// Events that validate; defaults to `trigger`.
    pub validate_trigger: Option<TriggerDecl>,
    pub value_prop_name: Option<String>,
    /// Rules fired on `validate_trigger`.
    pub rules: Option<Vec<Rule>>,
    /// Rules with their own triggers.
    pub validate: Vec<RuleDecl>,
    pub initial_value: Option<Value>,
    pub hidden: Option<bool>,
    pub preserve: Option<bool>,
    pub validate_first: Option<bool>,
    #[serde(skip)]
    pub normalize: Option<NormalizeFn>,
    #[serde(skip)]
    pub instance_sink: Option<Arc<dyn InstanceSink>>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn validate_trigger(mut self, trigger: impl Into<TriggerDecl>) -> Self {
        self.validate_trigger = Some(trigger.into());
        self
    }

    pub fn value_prop_name(mut self, name: impl Into<String>) -> Self {
        self.value_prop_name = Some(name.into());
        self
    }

    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn validate(mut self, decl: RuleDecl) -> Self {
        self.validate.push(decl);
        self
    }

    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn preserve(mut self, preserve: bool) -> Self {
        self.preserve = Some(preserve);
        self
    }

    pub fn validate_first(mut self, validate_first: bool) -> Self {
        self.validate_first = Some(validate_first);
        self
    }

    pub fn normalize(
        mut self,
        normalize: impl Fn(&Value, &Value, &FieldValues) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.normalize = Some(Arc::new(normalize));
        self
    }

    pub fn instance_sink(mut self, sink: Arc<dyn InstanceSink>) -> Self {
        self.instance_sink = Some(sink);
        self
    }

    /// Write these options over `meta`.
    pub(crate) fn apply(self, meta: &mut FieldMeta, default_trigger: &str) {
        let trigger = self.trigger.unwrap_or_else(|| default_trigger.to_string());
        let validate_trigger: TriggerSet = match &self.validate_trigger {
            Some(decl) => decl.to_set(),
            None => std::iter::once(trigger.clone()).collect(),
        };

        meta.rule_groups = normalize(&self.validate, self.rules.as_deref(), &validate_trigger);
        meta.trigger = trigger;
        meta.value_prop_name = self.value_prop_name.unwrap_or_else(|| "value".to_string());

        if let Some(value) = self.initial_value {
            meta.initial_value = Some(value);
        }
        if let Some(hidden) = self.hidden {
            meta.hidden = hidden;
        }
        if let Some(preserve) = self.preserve {
            meta.preserve = preserve;
        }
        if let Some(validate_first) = self.validate_first {
            meta.validate_first = validate_first;
        }
        if self.normalize.is_some() {
            meta.normalize = self.normalize;
        }
        if self.instance_sink.is_some() {
            meta.instance_sink = self.instance_sink;
        }
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("trigger", &self.trigger)
            .field("validate_trigger", &self.validate_trigger)
            .field("value_prop_name", &self.value_prop_name)
            .field("rules", &self.rules)
            .field("validate", &self.validate)
            .field("initial_value", &self.initial_value)
            .field("hidden", &self.hidden)
            .field("preserve", &self.preserve)
            .field("validate_first", &self.validate_first)
            .field("normalize", &self.normalize.is_some())
            .field("instance_sink", &self.instance_sink.is_some())
            .finish()
    }
}
