//! Render-pass bookkeeping.

use formwork_core::FieldPath;
use formwork_registry::{Field, FieldMeta, FieldRegistry, FieldPatch, Instance};
use indexmap::{IndexMap, IndexSet};

/// A field removed on detach, kept until the render pass ends.
#[derive(Debug, Clone)]
pub(crate) struct ClearedField {
    field: Option<Field>,
    meta: FieldMeta,
}

/// Which fields the host rendered and mounted, and which it just dropped.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    cleared: IndexMap<FieldPath, ClearedField>,
    rendered: IndexSet<FieldPath>,
    attached: IndexSet<FieldPath>,
    instances: IndexMap<FieldPath, Instance>,
}

impl Lifecycle {
    pub fn mark_rendered(&mut self, path: &FieldPath) {
        self.rendered.insert(path.clone());
    }

    pub fn mark_attached(&mut self, path: &FieldPath, instance: Instance) {
        self.attached.insert(path.clone());
        self.instances.insert(path.clone(), instance);
    }

    pub fn mark_detached(&mut self, path: &FieldPath) {
        self.attached.shift_remove(path);
    }

    pub fn instance(&self, path: &FieldPath) -> Option<Instance> {
        self.instances.get(path).cloned()
    }

    /// Move the field and meta of `path` into the cleared cache.
    pub fn stash(&mut self, registry: &mut FieldRegistry, path: &FieldPath) {
        let Some(meta) = registry.field_meta(path).cloned() else {
            return;
        };
        let field = registry.stored_field(path).cloned();
        self.cleared.insert(path.clone(), ClearedField { field, meta });
        self.clear(registry, path);
    }

    /// Put a stashed field back into the registry.
    pub fn recover(&mut self, registry: &mut FieldRegistry, path: &FieldPath) -> bool {
        let Some(ClearedField { field, meta }) = self.cleared.shift_remove(path) else {
            return false;
        };
        registry.set_field_meta(path, meta);
        if let Some(field) = field {
            registry.set_fields(FieldPatch::from([(path.clone(), field)]));
        }
        true
    }

    /// Drop stashed entries of `names`, or all of them.
    pub fn forget(&mut self, names: Option<&[FieldPath]>) {
        match names {
            Some(names) => self.cleared.retain(|path, _| !names.contains(path)),
            None => self.cleared.clear(),
        }
    }

    pub fn is_stashed(&self, path: &FieldPath) -> bool {
        self.cleared.contains_key(path)
    }

    fn clear(&mut self, registry: &mut FieldRegistry, path: &FieldPath) {
        registry.clear_field(path);
        self.instances.shift_remove(path);
    }

    /// Remove every field that was neither rendered nor attached this pass
    /// and is not preserved, then start a new pass.
    pub fn end_pass(&mut self, registry: &mut FieldRegistry) -> Vec<FieldPath> {
        let removed: Vec<FieldPath> = registry
            .all_names()
            .into_iter()
            .filter(|path| {
                !self.rendered.contains(path)
                    && !self.attached.contains(path)
                    && !registry.field_meta(path).map_or(false, |meta| meta.preserve)
            })
            .collect();
        for path in &removed {
            self.clear(registry, path);
        }
        self.rendered.clear();
        self.cleared.clear();
        removed
    }
}
