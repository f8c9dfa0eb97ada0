//! The form facade.

use std::sync::Arc;

use formwork_core::nested;
use formwork_core::{Diagnostic, DiagnosticSink, FieldPath, Value};
use formwork_registry::{
    with_registry, Field, FieldPatch, FieldRegistry, FormListener, Instance, NoopListener,
    SharedRegistry,
};
use formwork_rule::{FirstFields, RuleEngine};
use formwork_validate::{
    ErrorTree, Orchestrator, ValidateOptions, ValidationOutcome, ValidationRequest,
};
use parking_lot::Mutex;
use serde_json::Map;
use tracing::debug;

use crate::binding::FieldBinding;
use crate::error::{FormError, FormResult, ValidationFailure};
use crate::lifecycle::Lifecycle;
use crate::options::{FieldOptions, FormOptions};

fn settle(outcome: ValidationOutcome) -> FormResult<Value> {
    match outcome.errors {
        Some(errors) => Err(FormError::ValidationFailed(ValidationFailure {
            errors,
            values: outcome.values,
        })),
        None => Ok(outcome.values),
    }
}

/// Values reported to `FormListener::values_changed`.
struct ValuesChange {
    changed: Value,
    all: Value,
}

/// A form: registered fields, their state and their validation.
///
/// Every method takes `&self`; a validation pass may be awaited while other
/// calls keep collecting values.
pub struct Form {
    registry: SharedRegistry,
    orchestrator: Orchestrator,
    options: FormOptions,
    listener: Arc<dyn FormListener>,
    lifecycle: Mutex<Lifecycle>,
}

impl Form {
    /// Create a form validating with `engine`.
    pub fn new(options: FormOptions, engine: Arc<dyn RuleEngine>) -> Self {
        let registry: SharedRegistry = Arc::new(Mutex::new(FieldRegistry::new()));
        let orchestrator = Orchestrator::new(registry.clone(), engine)
            .with_messages(options.validate_messages.clone());
        Self {
            registry,
            orchestrator,
            options,
            listener: Arc::new(NoopListener),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn FormListener>) -> Self {
        self.orchestrator = self.orchestrator.with_listener(listener.clone());
        self.listener = listener;
        self
    }

    pub fn with_diagnostics(self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.registry.lock().set_diagnostics(diagnostics);
        self
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Shared handle to the underlying registry.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    // ==================== Registration ====================

    /// Register `name` for this render pass and return its event wiring.
    pub fn register(&self, name: &FieldPath, options: FieldOptions) -> FormResult<FieldBinding> {
        if name.is_empty() {
            return Err(FormError::structural_misuse(
                "Must register a field with a non-empty name",
            ));
        }

        let (binding, pending) = {
            let mut lifecycle = self.lifecycle.lock();
            let mut registry = self.registry.lock();
            let binding = self.bind(&mut lifecycle, &mut registry, name, options);
            (binding, registry.take_diagnostics())
        };
        pending.deliver();
        Ok(binding)
    }

    fn bind(
        &self,
        lifecycle: &mut Lifecycle,
        registry: &mut FieldRegistry,
        name: &FieldPath,
        options: FieldOptions,
    ) -> FieldBinding {
        let conflict = registry.conflicting_name(name).cloned();
        if let Some(existing) = conflict {
            registry.report(Diagnostic::registration_conflict(name.clone(), existing));
        }
        if lifecycle.recover(registry, name) {
            debug!(path = %name, "recovered cleared field");
        }

        let meta = registry.get_or_create_meta(name);
        options.apply(meta, &self.options.default_trigger);

        let validate_triggers = formwork_rule::triggers_of(&meta.rule_groups);
        let collect_trigger = Some(meta.trigger.clone())
            .filter(|trigger| !trigger.is_empty() && !validate_triggers.contains(trigger));
        let value_prop_name = meta.value_prop_name.clone();

        lifecycle.mark_rendered(name);

        FieldBinding {
            name: name.clone(),
            id: self.binding_id(name),
            value_prop_name,
            value: registry.get_field_value(name),
            validate_triggers,
            collect_trigger,
        }
    }

    /// Register several fields at once.
    ///
    /// Fails without registering anything when two of the names prefix
    /// each other or repeat.
    pub fn register_all(
        &self,
        fields: Vec<(FieldPath, FieldOptions)>,
    ) -> FormResult<Vec<FieldBinding>> {
        if fields.iter().any(|(name, _)| name.is_empty()) {
            return Err(FormError::structural_misuse(
                "Must register a field with a non-empty name",
            ));
        }
        for (i, (a, _)) in fields.iter().enumerate() {
            for (b, _) in &fields[i + 1..] {
                if a == b || a.conflicts_with(b) {
                    return Err(FormError::structural_misuse(format!(
                        "One field name cannot be part of another: '{}' and '{}'",
                        a, b
                    )));
                }
            }
        }
        fields
            .into_iter()
            .map(|(name, options)| self.register(&name, options))
            .collect()
    }

    fn binding_id(&self, name: &FieldPath) -> String {
        match &self.options.name {
            Some(form) => format!("{}_{}", form, name),
            None => name.to_string(),
        }
    }

    /// Record that `instance` is mounted for `name`.
    pub fn attach(&self, name: &FieldPath, instance: Instance) {
        let sink = {
            let mut lifecycle = self.lifecycle.lock();
            let mut registry = self.registry.lock();
            lifecycle.recover(&mut registry, name);
            lifecycle.mark_attached(name, instance.clone());
            registry
                .field_meta(name)
                .and_then(|meta| meta.instance_sink.clone())
        };
        if let Some(sink) = sink {
            sink.attach(Some(instance));
        }
    }

    /// Record that the instance of `name` went away.
    ///
    /// A field that is not preserved is removed and stashed until the render
    /// pass ends; registering or attaching it again restores it.
    pub fn detach(&self, name: &FieldPath) {
        let sink = {
            let mut lifecycle = self.lifecycle.lock();
            let mut registry = self.registry.lock();
            lifecycle.mark_detached(name);
            let Some(meta) = registry.field_meta(name) else {
                return;
            };
            let sink = meta.instance_sink.clone();
            if !meta.preserve {
                lifecycle.stash(&mut registry, name);
            }
            sink
        };
        if let Some(sink) = sink {
            sink.attach(None);
        }
    }

    /// Instance currently mounted for `name`.
    pub fn instance(&self, name: &FieldPath) -> Option<Instance> {
        self.lifecycle.lock().instance(name)
    }

    /// Drop fields that were neither rendered nor attached during the pass.
    pub fn end_render_pass(&self) -> Vec<FieldPath> {
        let mut lifecycle = self.lifecycle.lock();
        let mut registry = self.registry.lock();
        let removed = lifecycle.end_pass(&mut registry);
        if !removed.is_empty() {
            debug!(removed = removed.len(), "cleaned up unused fields");
        }
        removed
    }

    // ==================== Collection ====================

    /// Store a value extracted from `action` without validating it.
    pub fn collect(&self, name: &FieldPath, action: &str, value: Value) {
        let collected = with_registry(&self.registry, |registry| {
            let (mut field, values_change) = self.collected_field(registry, name, value)?;
            field.dirty = Some(registry.field_meta(name).map_or(false, |meta| meta.has_rules()));
            registry.set_fields_as_dirty();
            let changed = registry.set_fields(FieldPatch::from([(name.clone(), field)]));
            Some((changed, values_change))
        });
        let Some((changed, values_change)) = collected else {
            return;
        };
        debug!(path = %name, action, "collected value");
        self.notify_values(values_change);
        self.notify_fields(&changed);
    }

    /// Store a value extracted from `action` and validate the rules bound to it.
    pub async fn collect_and_validate(
        &self,
        name: &FieldPath,
        action: &str,
        value: Value,
    ) -> FormResult<ValidationOutcome> {
        let Some(first_fields) = self.commit_for_validation(name, value) else {
            return Ok(ValidationOutcome {
                errors: None,
                values: Value::Object(Map::new()),
            });
        };
        let request = ValidationRequest::new(vec![name.clone()])
            .action(action)
            .options(ValidateOptions {
                force: false,
                first_fields: Some(first_fields),
            });
        Ok(self.orchestrator.run(request).await?)
    }

    /// Commit the collected value; `None` when `name` is not registered.
    fn commit_for_validation(&self, name: &FieldPath, value: Value) -> Option<FirstFields> {
        let (changed, values_change, validate_first) = with_registry(&self.registry, |registry| {
            let (mut field, values_change) = self.collected_field(registry, name, value)?;
            field.dirty = Some(true);
            let validate_first = registry.field_meta(name).map_or(false, |meta| meta.validate_first);
            registry.set_fields_as_dirty();
            let changed = registry.set_fields(FieldPatch::from([(name.clone(), field)]));
            Some((changed, values_change, validate_first))
        })?;
        self.notify_values(values_change);
        self.notify_fields(&changed);
        Some(FirstFields::from(validate_first))
    }

    /// The field of `name` with `value` collected, plus the value change to report.
    fn collected_field(
        &self,
        registry: &FieldRegistry,
        name: &FieldPath,
        value: Value,
    ) -> Option<(Field, Option<ValuesChange>)> {
        if !registry.is_registered(name) {
            registry.report(Diagnostic::unregistered_write(name.clone()));
            return None;
        }
        let values_change = (registry.get_field_value(name) != value).then(|| {
            let mut all = registry.get_all_values();
            nested::insert_at(&mut all, name, value.clone());
            ValuesChange {
                changed: nested::build([(name, value.clone())]),
                all,
            }
        });
        let mut field = registry.get_field(name);
        field.value = Some(value);
        field.touched = true;
        Some((field, values_change))
    }

    // ==================== Queries ====================

    pub fn get_field(&self, name: &FieldPath) -> Field {
        self.registry.lock().get_field(name)
    }

    /// Value of a field, or the nested values below a partial name.
    pub fn get_field_value(&self, name: &FieldPath) -> Value {
        self.registry.lock().get_field_value(name)
    }

    /// Nested values of `names` (all active fields when `None`).
    pub fn get_fields_value(&self, names: Option<&[FieldPath]>) -> Value {
        with_registry(&self.registry, |registry| registry.get_fields_value(names))
    }

    pub fn get_field_error(&self, name: &FieldPath) -> Value {
        self.registry.lock().get_field_error(name)
    }

    pub fn get_fields_error(&self, names: Option<&[FieldPath]>) -> Value {
        with_registry(&self.registry, |registry| registry.get_fields_error(names))
    }

    pub fn is_field_touched(&self, name: &FieldPath) -> bool {
        self.registry.lock().is_field_touched(name)
    }

    pub fn is_fields_touched(&self, names: Option<&[FieldPath]>) -> bool {
        with_registry(&self.registry, |registry| registry.is_fields_touched(names))
    }

    pub fn is_field_validating(&self, name: &FieldPath) -> bool {
        self.registry.lock().is_field_validating(name)
    }

    pub fn is_fields_validating(&self, names: Option<&[FieldPath]>) -> bool {
        with_registry(&self.registry, |registry| registry.is_fields_validating(names))
    }

    /// Nested snapshot of every field's state.
    pub fn fields_snapshot(&self) -> Value {
        self.registry.lock().nested_all_fields()
    }

    // ==================== Mutations ====================

    /// Replace whole fields; unregistered paths are dropped.
    pub fn set_fields(&self, patch: FieldPatch) -> Vec<FieldPath> {
        let changed = with_registry(&self.registry, |registry| registry.set_fields(patch));
        self.notify_fields(&changed);
        changed
    }

    /// Set values from a nested value.
    ///
    /// Leaves that reach no registered path are reported as unregistered
    /// writes. Written fields lose their errors and flags.
    pub fn set_fields_value(&self, values: &Value) -> Vec<FieldPath> {
        let (changed, all) = with_registry(&self.registry, |registry| {
            let flattened = registry.flatten_registered(values);
            for path in flattened.unmatched {
                registry.report(Diagnostic::unregistered_write(path));
            }
            let patch: FieldPatch = flattened
                .leaves
                .into_iter()
                .map(|(path, value)| (path, Field::with_value(value)))
                .collect();
            let changed = registry.set_fields(patch);
            (changed, registry.get_all_values())
        });
        self.notify_fields(&changed);
        self.listener.values_changed(values, &all);
        changed
    }

    /// Override initial values of registered fields from a nested value.
    pub fn set_fields_initial_value(&self, values: &Value) {
        self.registry.lock().set_fields_initial_value(values);
    }

    /// Revert `names` (all fields when `None`) to their initial values.
    pub fn reset_fields(&self, names: Option<&[FieldPath]>) {
        let (changed, pending) = {
            let mut lifecycle = self.lifecycle.lock();
            let mut registry = self.registry.lock();
            let patch = registry.reset_fields(names);
            let changed = if patch.is_empty() {
                Vec::new()
            } else {
                registry.set_fields(patch)
            };
            lifecycle.forget(names);
            (changed, registry.take_diagnostics())
        };
        pending.deliver();
        self.notify_fields(&changed);
    }

    // ==================== Validation ====================

    /// Validate `names` (all active fields when `None`).
    ///
    /// Resolves to the nested values of the validated names, or rejects
    /// with a [`ValidationFailure`] carrying the errors and the same values.
    pub async fn validate_fields(
        &self,
        names: Option<&[FieldPath]>,
        options: ValidateOptions,
    ) -> FormResult<Value> {
        let outcome = self.run_validation(names, options).await?;
        settle(outcome)
    }

    /// [`Form::validate_fields`], also handing the outcome to `callback`.
    pub async fn validate_fields_with<F>(
        &self,
        names: Option<&[FieldPath]>,
        options: ValidateOptions,
        callback: F,
    ) -> FormResult<Value>
    where
        F: FnOnce(Option<&ErrorTree>, &Value),
    {
        let outcome = self.run_validation(names, options).await?;
        callback(outcome.errors.as_ref(), &outcome.values);
        settle(outcome)
    }

    async fn run_validation(
        &self,
        names: Option<&[FieldPath]>,
        mut options: ValidateOptions,
    ) -> FormResult<ValidationOutcome> {
        let (fields, field_names) = with_registry(&self.registry, |registry| {
            let field_names = match names {
                Some(names) => registry.resolve_full_names(names),
                None => registry.active_names(),
            };
            let fields: Vec<FieldPath> = field_names
                .iter()
                .filter(|name| registry.field_meta(name).map_or(false, |meta| meta.has_rules()))
                .cloned()
                .collect();
            if options.first_fields.is_none() {
                let first: Vec<FieldPath> = field_names
                    .iter()
                    .filter(|name| registry.field_meta(name).map_or(false, |meta| meta.validate_first))
                    .cloned()
                    .collect();
                options.first_fields = Some(FirstFields::Only(first));
            }
            (fields, field_names)
        });

        if fields.is_empty() {
            let values = with_registry(&self.registry, |registry| {
                registry.get_fields_value(Some(field_names.as_slice()))
            });
            return Ok(ValidationOutcome { errors: None, values });
        }

        let request = ValidationRequest::new(fields)
            .field_names(field_names)
            .options(options);
        Ok(self.orchestrator.run(request).await?)
    }

    // ==================== Notification ====================

    fn notify_fields(&self, changed: &[FieldPath]) {
        if !changed.is_empty() {
            self.listener.fields_changed(changed);
        }
    }

    fn notify_values(&self, change: Option<ValuesChange>) {
        if let Some(change) = change {
            self.listener.values_changed(&change.changed, &change.all);
        }
    }
}
