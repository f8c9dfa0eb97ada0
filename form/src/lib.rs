//! Formwork Form
//!
//! Host-facing facade over the registry and the validation orchestrator.
//!
//! Responsibilities:
//! - Register fields and compute the events each binding listens to
//! - Track render passes, mounted instances and recently cleared fields
//! - Collect values from interaction events, optionally validating them
//! - Expose queries, mutations and whole-form validation

mod binding;
mod error;
mod form;
mod lifecycle;
mod options;

pub use binding::{FieldBinding, Handler};
pub use error::{FormError, FormResult, ValidationFailure};
pub use form::Form;
pub use options::{FieldOptions, FormOptions};
