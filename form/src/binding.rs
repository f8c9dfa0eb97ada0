//! What a registration hands back to the binding layer.

use formwork_core::{FieldPath, Value};
use formwork_rule::TriggerSet;
use serde::Serialize;

/// Form operation an event should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Handler {
    /// [`Form::collect`](crate::Form::collect)
    Collect,
    /// [`Form::collect_and_validate`](crate::Form::collect_and_validate)
    CollectAndValidate,
}

/// Event wiring and current value of a registered field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldBinding {
    pub name: FieldPath,
    /// Element id, prefixed with the form name when the form has one.
    pub id: String,
    pub value_prop_name: String,
    pub value: Value,
    /// Events that collect and validate.
    pub validate_triggers: TriggerSet,
    /// Event that only collects, unless it already validates.
    pub collect_trigger: Option<String>,
}

impl FieldBinding {
    /// Handler bound to `event`, if any.
    pub fn handler(&self, event: &str) -> Option<Handler> {
        if self.validate_triggers.contains(event) {
            Some(Handler::CollectAndValidate)
        } else if self.collect_trigger.as_deref() == Some(event) {
            Some(Handler::Collect)
        } else {
            None
        }
    }

    /// Every bound event with its handler.
    pub fn events(&self) -> Vec<(&str, Handler)> {
        let mut events: Vec<(&str, Handler)> = self
            .validate_triggers
            .iter()
            .map(|event| (event.as_str(), Handler::CollectAndValidate))
            .collect();
        if let Some(event) = &self.collect_trigger {
            events.push((event.as_str(), Handler::Collect));
        }
        events
    }
}
