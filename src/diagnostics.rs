//! Non-fatal findings collected while lowering.
//!
//! Lowering never aborts on a construct it cannot handle. Each such case is recorded here and
//! mirrored to `tracing` at `warn` level, then the walker carries on with the effect dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A statement or expression shape the walker does not lower.
    Unsupported,
    /// A member, method, variable or host object that could not be found.
    Unresolved,
    /// A record missing a required child or metadata.
    Malformed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Unsupported => write!(f, "unsupported"),
            DiagnosticKind::Unresolved => write!(f, "unresolved"),
            DiagnosticKind::Malformed => write!(f, "malformed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The method being lowered when the diagnostic was raised.
    pub method: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.method, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    method: String,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method name attached to subsequent diagnostics.
    pub fn set_method(&mut self, method: &str) {
        self.method = method.to_string();
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn unsupported(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::Unsupported, message.into());
    }

    pub fn unresolved(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::Unresolved, message.into());
    }

    pub fn malformed(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::Malformed, message.into());
    }

    fn push(&mut self, kind: DiagnosticKind, message: String) {
        tracing::warn!(kind = %kind, method = %self.method, "{}", message);
        self.entries.push(Diagnostic {
            kind,
            method: self.method.clone(),
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
