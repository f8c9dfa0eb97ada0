//! Validation orchestrator.

use std::sync::Arc;

use formwork_core::{FieldPath, FieldValues};
use formwork_registry::{
    with_registry, FieldPatch, FieldRegistry, FormListener, NoopListener, SharedRegistry,
    ValidationError,
};
use formwork_rule::{rules_for, EngineRequest, MessageCatalog, Rule, RuleEngine};
use indexmap::IndexMap;
use tracing::debug;

use crate::attribute::attribute;
use crate::error::{ValidateError, ValidateResult};
use crate::request::{ValidationOutcome, ValidationRequest};
use crate::tree::{ErrorTree, FieldErrors};

/// Phase of a running pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    /// No pass is running.
    Idle,
    /// Selecting fields and committing their pending state.
    Collecting,
    /// Waiting for the rule engine.
    AwaitingEngine,
    /// Attributing violations and committing results.
    Reconciling,
}

/// Fields selected by the collecting phase.
struct Selection {
    rules: IndexMap<FieldPath, Vec<Rule>>,
    snapshot: FieldValues,
    carried: ErrorTree,
    changed: Vec<FieldPath>,
}

/// Phase tracker of a single pass.
struct Pass {
    phase: ValidationPhase,
}

impl Pass {
    fn new() -> Self {
        Self {
            phase: ValidationPhase::Idle,
        }
    }

    fn enter(&mut self, phase: ValidationPhase) {
        debug!(from = ?self.phase, to = ?phase, "validation phase");
        self.phase = phase;
    }
}

/// Runs validation passes against a shared registry.
///
/// The registry lock is held only while collecting and while reconciling,
/// never across the engine call, so passes may overlap. Each pass checks its
/// own snapshot against the current values and discards stale results.
#[derive(Clone)]
pub struct Orchestrator {
    registry: SharedRegistry,
    engine: Arc<dyn RuleEngine>,
    messages: Option<MessageCatalog>,
    listener: Arc<dyn FormListener>,
}

impl Orchestrator {
    pub fn new(registry: SharedRegistry, engine: Arc<dyn RuleEngine>) -> Self {
        Self {
            registry,
            engine,
            messages: None,
            listener: Arc::new(NoopListener),
        }
    }

    /// Message templates passed to the engine on every pass.
    pub fn with_messages(mut self, messages: Option<MessageCatalog>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn FormListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Run one pass to completion.
    pub async fn run(&self, request: ValidationRequest) -> ValidateResult<ValidationOutcome> {
        let mut pass = Pass::new();

        pass.enter(ValidationPhase::Collecting);
        let selection = self.collect(&request)?;
        self.notify(&selection.changed);

        let Selection {
            rules,
            snapshot,
            carried: mut tree,
            ..
        } = selection;

        if rules.is_empty() {
            debug!(carried = tree.len(), "nothing to validate");
            let outcome = self.outcome(tree, request.field_names.as_deref());
            pass.enter(ValidationPhase::Idle);
            return Ok(outcome);
        }

        pass.enter(ValidationPhase::AwaitingEngine);
        let engine_request = EngineRequest {
            rules: rules.clone(),
            values: snapshot.clone(),
            messages: self.messages.clone(),
            first_fields: request.options.first_fields.clone().unwrap_or_default(),
        };
        let violations = self.engine.validate(engine_request).await?;

        pass.enter(ValidationPhase::Reconciling);
        for violation in violations {
            let owner = attribute(&violation.field, &rules);
            tree.push(owner, ValidationError::new(violation.field, violation.message));
        }

        let (expired, changed) = self.commit(&snapshot, &tree);
        self.notify(&changed);
        for path in expired {
            tree.set(path.clone(), FieldErrors::expired(&path));
        }

        let outcome = self.outcome(tree, request.field_names.as_deref());
        pass.enter(ValidationPhase::Idle);
        Ok(outcome)
    }

    /// Select fields, mark them pending and snapshot their values.
    fn collect(&self, request: &ValidationRequest) -> ValidateResult<Selection> {
        with_registry(&self.registry, |registry| Self::select(registry, request))
    }

    fn select(registry: &mut FieldRegistry, request: &ValidationRequest) -> ValidateResult<Selection> {
        let mut rules = IndexMap::new();
        let mut pending = FieldPatch::new();
        let mut carried = ErrorTree::new();

        for path in &request.fields {
            let meta = registry
                .field_meta(path)
                .ok_or_else(|| ValidateError::unregistered_field(path.clone()))?;
            let selected = rules_for(&meta.rule_groups, request.action.as_deref());

            let mut field = registry.get_field(path);
            if !request.options.force && field.is_clean() {
                if let Some(errors) = field.errors {
                    carried.set(path.clone(), FieldErrors::new(errors));
                }
                continue;
            }

            field.value = Some(registry.effective_value(path));
            field.errors = None;
            field.validating = true;
            field.dirty = Some(true);
            rules.insert(path.clone(), selected);
            pending.insert(path.clone(), field);
        }

        let changed = registry.set_fields(pending);
        // Normalizers may have rewritten the committed values.
        let snapshot = rules
            .keys()
            .map(|path| (path.clone(), registry.effective_value(path)))
            .collect();
        debug!(selected = rules.len(), carried = carried.len(), "collected fields");

        Ok(Selection {
            rules,
            snapshot,
            carried,
            changed,
        })
    }

    /// Commit results whose values are unchanged; return the stale paths.
    fn commit(&self, snapshot: &FieldValues, tree: &ErrorTree) -> (Vec<FieldPath>, Vec<FieldPath>) {
        with_registry(&self.registry, |registry| Self::reconcile(registry, snapshot, tree))
    }

    fn reconcile(
        registry: &mut FieldRegistry,
        snapshot: &FieldValues,
        tree: &ErrorTree,
    ) -> (Vec<FieldPath>, Vec<FieldPath>) {
        let mut updates = FieldPatch::new();
        let mut expired = Vec::new();

        for (path, value) in snapshot {
            if !registry.is_registered(path) {
                debug!(path = %path, "field removed during validation");
                continue;
            }
            // A reset clears the stored value even when the initial value
            // matches the snapshot.
            let stored = registry.stored_field(path).and_then(|field| field.value.as_ref());
            if stored != Some(value) {
                expired.push(path.clone());
                continue;
            }
            let mut field = registry.get_field(path);
            field.errors = tree.get(path).map(|e| e.errors.clone());
            field.value = Some(value.clone());
            field.validating = false;
            field.dirty = Some(false);
            updates.insert(path.clone(), field);
        }

        let changed = registry.set_fields(updates);
        debug!(committed = changed.len(), expired = expired.len(), "reconciled results");
        (expired, changed)
    }

    fn outcome(&self, tree: ErrorTree, names: Option<&[FieldPath]>) -> ValidationOutcome {
        let values = with_registry(&self.registry, |registry| registry.get_fields_value(names));
        ValidationOutcome {
            errors: if tree.is_empty() { None } else { Some(tree) },
            values,
        }
    }

    fn notify(&self, changed: &[FieldPath]) {
        if !changed.is_empty() {
            self.listener.fields_changed(changed);
        }
    }
}
