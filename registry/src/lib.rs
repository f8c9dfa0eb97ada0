//! Formwork Registry
//!
//! Runtime state of registered fields. Single source of truth for field values,
//! per-field status flags and per-field configuration.
//!
//! Responsibilities:
//! - Store path to Field and path to FieldMeta
//! - Merge patches and re-apply normalizers after every merge
//! - Resolve partial names to the full paths below them
//! - Project flat state into nested values, errors and field snapshots
//! - Hold diagnostics until the registry lock is released

mod field;
mod instance;
mod listener;
mod meta;
mod registry;

use std::sync::Arc;

use parking_lot::Mutex;

pub use field::{Field, FieldPatch, ValidationError};
pub use instance::{CallbackSink, CellSink, Instance, InstanceSink};
pub use listener::{FormListener, NoopListener};
pub use meta::{FieldMeta, NormalizeFn};
pub use registry::{FieldRegistry, PendingDiagnostics};

/// Registry handle shared between the form and in-flight validation passes.
pub type SharedRegistry = Arc<Mutex<FieldRegistry>>;

/// Run `f` under the registry lock, then deliver the diagnostics it reported.
pub fn with_registry<T>(registry: &SharedRegistry, f: impl FnOnce(&mut FieldRegistry) -> T) -> T {
    let (out, pending) = {
        let mut guard = registry.lock();
        let out = f(&mut guard);
        (out, guard.take_diagnostics())
    };
    pending.deliver();
    out
}
