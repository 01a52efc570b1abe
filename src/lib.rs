//! # Kumiki - Procedural-to-Graph Lowering
//!
//! **Kumiki** compiles a reflected class (its fields and its `Start`/`Update`-style methods) into
//! an interactivity node graph: typed operation nodes with value and flow sockets, a global
//! variable table and a custom event table. The graph only touches host state through
//! templated pointer paths, so it can run wherever the graph runtime runs.
//!
//! ## Core Workflow
//!
//! 1.  **Load the class**: read the reflected syntax model from JSON with
//!     [`ClassInfo::from_json`](lower::ClassInfo::from_json), or build it in code.
//! 2.  **Compile**: configure a [`Compiler`](compiler::Compiler) through `Compiler::builder`
//!     and call `compile`. Lowering walks every entry method, then literal placeholders are
//!     folded into their sockets and the finished graph is validated.
//! 3.  **Inspect or store**: read the diagnostics and validation findings, print the graph
//!     with [`DisplayGraph`](graph::DisplayGraph), or persist it as a
//!     [`CompiledGraph`](artifact::CompiledGraph).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kumiki::prelude::*;
//! use kumiki::export::StaticResolver;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("path/to/Spinner.json")?;
//!     let class = ClassInfo::from_json(&json)?;
//!
//!     let compiler = Compiler::builder(class)
//!         .with_resolver(StaticResolver::new().with_self(0))
//!         .with_list_capacity(16)
//!         .build();
//!     let artifacts = compiler.compile()?;
//!
//!     for diagnostic in &artifacts.diagnostics {
//!         println!("{}", diagnostic);
//!     }
//!     println!("{}", artifacts.validation);
//!     println!("{}", DisplayGraph::new(&artifacts.graph));
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod builders;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod graph;
pub mod lower;
pub mod passes;
pub mod prelude;
