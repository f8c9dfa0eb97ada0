//! Formwork Core Types
//!
//! This crate provides the foundational types shared by every formwork crate:
//! - Field paths (FieldPath, Segment) and their canonical string codec
//! - Nested value helpers (insert_at, get_at, flatten)
//! - Diagnostics (Diagnostic, DiagnosticSink and its stock sinks)
//! - Path parsing errors

mod diagnostic;
mod error;
pub mod nested;
mod path;

pub use diagnostic::*;
pub use error::*;
pub use path::*;

/// Field values are plain JSON.
pub use serde_json::Value;

/// Flat map of full path to value, in registration order.
pub type FieldValues = indexmap::IndexMap<FieldPath, Value>;
