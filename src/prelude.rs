//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load a class, compile it and inspect the result.
//!
//! # Example
//!
//! ```rust,no_run
//! use kumiki::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/class.json")?;
//! let artifacts = Compiler::builder(ClassInfo::from_json(&json)?).build().compile()?;
//! println!("{} nodes", artifacts.graph.nodes.len());
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{CompilationArtifacts, Compiler, CompilerBuilder, CompilerOptions};
pub use crate::export::{AddressResolver, ExportContext, ObjectRef, StaticResolver};
pub use crate::lower::{ClassInfo, Walker};

// Graph model
pub use crate::graph::{
    ConfigValue, DisplayGraph, Graph, Literal, Node, NodeId, NodeRef, Op, ValueType,
};

// Reports
pub use crate::diagnostics::{Diagnostic, DiagnosticKind};
pub use crate::passes::{Finding, FindingKind, ValidationReport};

// Error types
pub use crate::error::{ArtifactError, AstLoadError, CompileError, ListError, LiteralError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
