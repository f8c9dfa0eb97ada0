//! Commit notifications.

use formwork_core::{FieldPath, Value};

/// Observer told about every merged patch.
///
/// Callbacks run after the registry lock is released, so a listener may read
/// the form again.
pub trait FormListener: Send + Sync {
    /// Fields were replaced by a merged patch.
    fn fields_changed(&self, _changed: &[FieldPath]) {}

    /// Values were changed through collection or `set_fields_value`.
    fn values_changed(&self, _changed: &Value, _all: &Value) {}
}

/// Listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl FormListener for NoopListener {}
