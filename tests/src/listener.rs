//! Listener that records every notification.

use formwork_core::{FieldPath, Value};
use formwork_registry::FormListener;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct RecordingListener {
    fields: Mutex<Vec<Vec<FieldPath>>>,
    values: Mutex<Vec<(Value, Value)>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changed paths of every `fields_changed` call.
    pub fn field_events(&self) -> Vec<Vec<FieldPath>> {
        self.fields.lock().clone()
    }

    /// `(changed, all)` of every `values_changed` call.
    pub fn value_events(&self) -> Vec<(Value, Value)> {
        self.values.lock().clone()
    }
}

impl FormListener for RecordingListener {
    fn fields_changed(&self, changed: &[FieldPath]) {
        self.fields.lock().push(changed.to_vec());
    }

    fn values_changed(&self, changed: &Value, all: &Value) {
        self.values.lock().push((changed.clone(), all.clone()));
    }
}
