//! Formwork integration test support.
//!
//! Rule engines and listeners for driving a [`Form`](formwork_form::Form)
//! from tests, plus tracing setup.

pub mod engine;
pub mod listener;

pub use engine::{FailingEngine, GatedEngine, SimpleEngine};
pub use listener::RecordingListener;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`, once per process.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Parse a path literal.
///
/// # Panics
///
/// Panics on an invalid path; intended for test literals only.
pub fn path(s: &str) -> formwork_core::FieldPath {
    match formwork_core::FieldPath::parse(s) {
        Ok(path) => path,
        Err(e) => panic!("invalid test path '{}': {}", s, e),
    }
}

pub mod prelude {
    pub use crate::{init_test_tracing, path};
    pub use crate::{FailingEngine, GatedEngine, RecordingListener, SimpleEngine};
    pub use formwork_core::{CollectingSink, Diagnostic, FieldPath, Value};
    pub use formwork_form::{FieldOptions, Form, FormError, FormOptions, Handler};
    pub use formwork_registry::{Field, FieldPatch, FieldRegistry};
    pub use formwork_rule::{MessageCatalog, Rule, RuleDecl};
    pub use formwork_validate::ValidateOptions;
    pub use serde_json::json;
    pub use std::sync::Arc;
}
