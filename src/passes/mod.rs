//! Post-lowering passes over the finished graph.

pub mod literals;
pub mod validate;

pub use literals::resolve_literals;
pub use validate::{Finding, FindingKind, ValidationReport, validate};
