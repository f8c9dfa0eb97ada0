//! Non-fatal diagnostics.
//!
//! Registry misuse that should not abort the call (conflicting registrations,
//! writes to unknown paths) is reported as a [`Diagnostic`] through a
//! [`DiagnosticSink`] supplied by the host.

use std::fmt;

use parking_lot::Mutex;
use tracing::warn;

use crate::path::FieldPath;

/// A recoverable problem noticed while handling a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A newly registered path is a prefix of, or prefixed by, an existing one.
    RegistrationConflict { path: FieldPath, existing: FieldPath },
    /// A write addressed a path that was never registered; it was dropped.
    UnregisteredWrite { path: FieldPath },
    /// A name passed to a group operation matched no registered field.
    UnresolvedName { path: FieldPath },
}

impl Diagnostic {
    pub fn registration_conflict(path: FieldPath, existing: FieldPath) -> Self {
        Self::RegistrationConflict { path, existing }
    }

    pub fn unregistered_write(path: FieldPath) -> Self {
        Self::UnregisteredWrite { path }
    }

    pub fn unresolved_name(path: FieldPath) -> Self {
        Self::UnresolvedName { path }
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::RegistrationConflict { .. } => "registration_conflict",
            Diagnostic::UnregisteredWrite { .. } => "unregistered_write",
            Diagnostic::UnresolvedName { .. } => "unresolved_name",
        }
    }

    /// The path the diagnostic is about.
    pub fn path(&self) -> &FieldPath {
        match self {
            Diagnostic::RegistrationConflict { path, .. }
            | Diagnostic::UnregisteredWrite { path }
            | Diagnostic::UnresolvedName { path } => path,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RegistrationConflict { path, existing } => write!(
                f,
                "One field name cannot be part of another: '{}' conflicts with '{}'",
                path, existing
            ),
            Diagnostic::UnregisteredWrite { path } => {
                write!(f, "Cannot set field '{}' before it is registered", path)
            }
            Diagnostic::UnresolvedName { path } => {
                write!(f, "Field name '{}' does not match any registered field", path)
            }
        }
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Logs every diagnostic at `warn` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!(kind = diagnostic.kind(), path = %diagnostic.path(), "{}", diagnostic);
    }
}

/// Keeps diagnostics in memory for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Drain everything reported so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}
