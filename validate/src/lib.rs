//! Formwork Validate
//!
//! Validation passes over registered fields.
//!
//! Responsibilities:
//! - Select the fields a pass must run and commit their pending state
//! - Invoke the rule engine once per pass without holding the registry lock
//! - Attribute reported violations to the fields that own them
//! - Discard results whose values changed while the engine was running

mod attribute;
mod error;
mod orchestrator;
mod request;
mod tree;

pub use attribute::attribute;
pub use error::{ValidateError, ValidateResult};
pub use orchestrator::{Orchestrator, ValidationPhase};
pub use request::{ValidateOptions, ValidationOutcome, ValidationRequest};
pub use tree::{expired_message, ErrorTree, FieldErrors};
