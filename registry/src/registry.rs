//! The FieldRegistry - authoritative field state.

use std::sync::Arc;

use formwork_core::nested::{self, Flattened};
use formwork_core::{
    Diagnostic, DiagnosticSink, FieldPath, FieldValues, Segment, TracingSink, Value,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Map;
use tracing::debug;

use crate::field::{Field, FieldPatch};
use crate::meta::FieldMeta;

/// Path-keyed store of field state and field configuration.
///
/// A path counts as registered while it has a meta. Metas are only created
/// through [`FieldRegistry::get_or_create_meta`] or
/// [`FieldRegistry::set_field_meta`]; reads never create them.
pub struct FieldRegistry {
    /// Collected state by full path.
    fields: IndexMap<FieldPath, Field>,
    /// Configuration by full path, in registration order.
    metas: IndexMap<FieldPath, FieldMeta>,
    diagnostics: Arc<dyn DiagnosticSink>,
    /// Reported but not yet delivered to `diagnostics`.
    pending: Mutex<Vec<Diagnostic>>,
}

/// Diagnostics taken out of a registry, to be delivered after unlocking it.
#[must_use = "pending diagnostics are lost unless delivered"]
pub struct PendingDiagnostics {
    sink: Arc<dyn DiagnosticSink>,
    diagnostics: Vec<Diagnostic>,
}

impl PendingDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Hand every diagnostic to the sink, in report order.
    pub fn deliver(self) {
        for diagnostic in self.diagnostics {
            self.sink.report(diagnostic);
        }
    }
}

impl FieldRegistry {
    /// Create an empty registry that logs diagnostics through `tracing`.
    pub fn new() -> Self {
        Self::with_diagnostics(Arc::new(TracingSink))
    }

    /// Create an empty registry reporting to `diagnostics`.
    pub fn with_diagnostics(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            fields: IndexMap::new(),
            metas: IndexMap::new(),
            diagnostics,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Route later diagnostics to `diagnostics`.
    pub fn set_diagnostics(&mut self, diagnostics: Arc<dyn DiagnosticSink>) {
        self.diagnostics = diagnostics;
    }

    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticSink> {
        &self.diagnostics
    }

    /// Queue `diagnostic` until [`FieldRegistry::take_diagnostics`].
    ///
    /// The sink is never called from here, so it may read the registry.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.pending.lock().push(diagnostic);
    }

    /// Take everything reported so far along with the sink it goes to.
    pub fn take_diagnostics(&self) -> PendingDiagnostics {
        PendingDiagnostics {
            sink: self.diagnostics.clone(),
            diagnostics: std::mem::take(&mut *self.pending.lock()),
        }
    }

    // ==================== Meta ====================

    /// Returns true if `path` has a meta.
    pub fn is_registered(&self, path: &FieldPath) -> bool {
        self.metas.contains_key(path)
    }

    /// Get the meta for `path`, if registered.
    pub fn field_meta(&self, path: &FieldPath) -> Option<&FieldMeta> {
        self.metas.get(path)
    }

    /// Get the meta for `path`, creating an empty one on first access.
    pub fn get_or_create_meta(&mut self, path: &FieldPath) -> &mut FieldMeta {
        self.metas
            .entry(path.clone())
            .or_insert_with(|| FieldMeta::new(path.clone()))
    }

    /// Store `meta` for `path`, replacing any previous one.
    pub fn set_field_meta(&mut self, path: &FieldPath, meta: FieldMeta) {
        self.metas.insert(path.clone(), meta);
    }

    /// First registered path that `path` would prefix or be prefixed by.
    pub fn conflicting_name(&self, path: &FieldPath) -> Option<&FieldPath> {
        self.metas.keys().find(|existing| existing.conflicts_with(path))
    }

    /// Returns true if `path` can join the registered paths without conflict.
    pub fn is_valid_nested_name(&self, path: &FieldPath) -> bool {
        self.conflicting_name(path).is_none()
    }

    /// Override initial values of registered paths from a nested value.
    pub fn set_fields_initial_value(&mut self, values: &Value) {
        let flattened = self.flatten_registered(values);
        for (path, value) in flattened.leaves {
            if let Some(meta) = self.metas.get_mut(&path) {
                meta.initial_value = Some(value);
            }
        }
    }

    // ==================== Names ====================

    /// Every registered path.
    pub fn all_names(&self) -> Vec<FieldPath> {
        self.metas.keys().cloned().collect()
    }

    /// Registered paths that are not hidden.
    pub fn active_names(&self) -> Vec<FieldPath> {
        self.metas
            .iter()
            .filter(|(_, meta)| !meta.hidden)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Active paths equal to, or below, any of `names`.
    ///
    /// Reports an `UnresolvedName` diagnostic for each input that matched
    /// nothing.
    pub fn resolve_full_names(&self, names: &[FieldPath]) -> Vec<FieldPath> {
        for name in names {
            let matched = self
                .metas
                .iter()
                .any(|(path, meta)| !meta.hidden && path.starts_with(name));
            if !matched {
                self.report(Diagnostic::unresolved_name(name.clone()));
            }
        }
        self.matching_names(names)
    }

    fn matching_names(&self, names: &[FieldPath]) -> Vec<FieldPath> {
        self.metas
            .iter()
            .filter(|(path, meta)| !meta.hidden && names.iter().any(|name| path.starts_with(name)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn names_or_active(&self, names: Option<&[FieldPath]>) -> Vec<FieldPath> {
        match names {
            Some(names) => self.resolve_full_names(names),
            None => self.active_names(),
        }
    }

    // ==================== Fields ====================

    /// State of `path`; an empty field when nothing was collected.
    pub fn get_field(&self, path: &FieldPath) -> Field {
        self.fields.get(path).cloned().unwrap_or_default()
    }

    /// Stored state of `path`, without defaulting.
    pub fn stored_field(&self, path: &FieldPath) -> Option<&Field> {
        self.fields.get(path)
    }

    /// Stored value, else initial value, else `null`.
    pub fn effective_value(&self, path: &FieldPath) -> Value {
        self.value_in(&self.fields, path)
    }

    fn value_in(&self, fields: &IndexMap<FieldPath, Field>, path: &FieldPath) -> Value {
        fields
            .get(path)
            .and_then(|field| field.value.clone())
            .or_else(|| self.metas.get(path).and_then(|meta| meta.initial_value.clone()))
            .unwrap_or(Value::Null)
    }

    /// Merge `patch` into the stored fields, then re-run every normalizer.
    ///
    /// Paths without a meta are dropped with an `UnregisteredWrite`
    /// diagnostic. Returns the paths that were written.
    pub fn set_fields(&mut self, patch: FieldPatch) -> Vec<FieldPath> {
        let mut now = self.fields.clone();
        let mut changed = Vec::with_capacity(patch.len());
        for (path, field) in patch {
            if !self.metas.contains_key(&path) {
                self.report(Diagnostic::unregistered_write(path));
                continue;
            }
            now.insert(path.clone(), field);
            changed.push(path);
        }

        let now_values: FieldValues = self
            .metas
            .keys()
            .map(|path| (path.clone(), self.value_in(&now, path)))
            .collect();

        for (path, meta) in &self.metas {
            let Some(normalize) = &meta.normalize else {
                continue;
            };
            let value = &now_values[path];
            let previous = self.value_in(&self.fields, path);
            let normalized = normalize(value, &previous, &now_values);
            if normalized != *value {
                now.entry(path.clone()).or_default().value = Some(normalized);
            }
        }

        self.fields = now;
        debug!(written = changed.len(), "merged field patch");
        changed
    }

    /// Mark every stored field that has rules as dirty.
    pub fn set_fields_as_dirty(&mut self) {
        for (path, field) in self.fields.iter_mut() {
            if self.metas.get(path).map_or(false, FieldMeta::has_rules) {
                field.dirty = Some(true);
            }
        }
    }

    /// Patch that drops the explicit value of every named field holding one.
    ///
    /// The caller applies it with [`FieldRegistry::set_fields`].
    pub fn reset_fields(&self, names: Option<&[FieldPath]>) -> FieldPatch {
        let names = match names {
            Some(names) => self.resolve_full_names(names),
            None => self.all_names(),
        };
        names
            .into_iter()
            .filter(|name| self.fields.get(name).map_or(false, |f| f.value.is_some()))
            .map(|name| (name, Field::default()))
            .collect()
    }

    /// Remove both the field and its meta.
    pub fn clear_field(&mut self, path: &FieldPath) {
        self.fields.shift_remove(path);
        self.metas.shift_remove(path);
    }

    // ==================== Projection ====================

    /// Nested value built from `getter` applied to every resolved full name.
    pub fn project_nested<F>(&self, names: Option<&[FieldPath]>, getter: F) -> Value
    where
        F: Fn(&FieldPath) -> Value,
    {
        let names = self.names_or_active(names);
        nested::build(names.iter().map(|name| (name, getter(name))))
    }

    /// Apply `getter` to `name`, or assemble the sub-tree below a partial name.
    fn nested_field<F>(&self, name: &FieldPath, getter: F) -> Value
    where
        F: Fn(&FieldPath) -> Value,
    {
        let full_names = self.matching_names(std::slice::from_ref(name));
        if full_names.is_empty() || (full_names.len() == 1 && full_names[0] == *name) {
            return getter(name);
        }

        let is_array = full_names[0]
            .segments()
            .get(name.len())
            .map_or(false, Segment::is_index);
        let mut acc = if is_array {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
        for full_name in &full_names {
            if let Some(suffix) = full_name.strip_prefix(name) {
                nested::insert_at(&mut acc, &suffix, getter(full_name));
            }
        }
        acc
    }

    /// Value of a full path, or the nested values below a partial one.
    pub fn get_field_value(&self, name: &FieldPath) -> Value {
        self.nested_field(name, |full| self.effective_value(full))
    }

    /// Nested values of `names` (all active fields when `None`).
    pub fn get_fields_value(&self, names: Option<&[FieldPath]>) -> Value {
        self.project_nested(names, |name| self.effective_value(name))
    }

    /// Nested values of every registered field, hidden ones included.
    pub fn get_all_values(&self) -> Value {
        nested::build(self.metas.keys().map(|path| (path, self.effective_value(path))))
    }

    /// Error messages of a full path, or nested below a partial one.
    pub fn get_field_error(&self, name: &FieldPath) -> Value {
        self.nested_field(name, |full| self.error_messages(full))
    }

    /// Nested error messages of `names` (all active fields when `None`).
    pub fn get_fields_error(&self, names: Option<&[FieldPath]>) -> Value {
        self.project_nested(names, |name| self.error_messages(name))
    }

    fn error_messages(&self, path: &FieldPath) -> Value {
        self.fields
            .get(path)
            .and_then(Field::error_messages)
            .map(Value::from)
            .unwrap_or(Value::Null)
    }

    /// Snapshot of every field, synthesizing never-collected active ones.
    pub fn nested_all_fields(&self) -> Value {
        let mut root = Value::Object(Map::new());
        for name in self.active_names() {
            if self.fields.contains_key(&name) {
                continue;
            }
            let synthesized = Field {
                value: self.metas.get(&name).and_then(|meta| meta.initial_value.clone()),
                ..Field::default()
            };
            nested::insert_at(&mut root, &name, synthesized.to_json(&name));
        }
        for (name, field) in &self.fields {
            nested::insert_at(&mut root, name, field.to_json(name));
        }
        root
    }

    /// Split a nested value into registered leaves and unmatched scalars.
    pub fn flatten_registered(&self, value: &Value) -> Flattened {
        nested::flatten(value, |path, _| self.metas.contains_key(path))
    }

    // ==================== Status ====================

    pub fn is_field_touched(&self, path: &FieldPath) -> bool {
        self.fields.get(path).map_or(false, |f| f.touched)
    }

    /// Returns true if any of `names` (all active fields when `None`) is touched.
    pub fn is_fields_touched(&self, names: Option<&[FieldPath]>) -> bool {
        self.names_or_active(names)
            .iter()
            .any(|name| self.is_field_touched(name))
    }

    pub fn is_field_validating(&self, path: &FieldPath) -> bool {
        self.fields.get(path).map_or(false, |f| f.validating)
    }

    /// Returns true if any of `names` (all active fields when `None`) is validating.
    pub fn is_fields_validating(&self, names: Option<&[FieldPath]>) -> bool {
        self.names_or_active(names)
            .iter()
            .any(|name| self.is_field_validating(name))
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}
