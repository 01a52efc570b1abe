use crate::diagnostics::Diagnostic;
use crate::error::CompileError;
use crate::export::{AddressResolver, ExportContext, StaticResolver};
use crate::graph::Graph;
use crate::lower::{ClassInfo, Walker};
use crate::passes::{ValidationReport, resolve_literals, validate};

#[cfg(feature = "debug-tools")]
use {crate::graph::DisplayGraph, std::fs};

mod options;

pub use options::*;

/// Everything one compilation produces.
#[derive(Debug, Clone)]
pub struct CompilationArtifacts {
    pub name: String,
    pub graph: Graph,
    /// Empty when validation is disabled in the options.
    pub validation: ValidationReport,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationArtifacts {
    /// No lowering diagnostics and no validation findings.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.validation.is_clean()
    }
}

/// Compiles one reflected class into a node graph. Consumed by [`Compiler::compile`].
pub struct Compiler {
    class: ClassInfo,
    options: CompilerOptions,
    resolver: Box<dyn AddressResolver>,
}

pub struct CompilerBuilder {
    class: ClassInfo,
    options: CompilerOptions,
    resolver: Box<dyn AddressResolver>,
}

impl CompilerBuilder {
    pub fn new(class: ClassInfo) -> Self {
        Self {
            class,
            options: CompilerOptions::default(),
            resolver: Box::new(StaticResolver::new()),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resolver(mut self, resolver: impl AddressResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_space_conversion(mut self, enabled: bool) -> Self {
        self.options.space_conversion = enabled;
        self
    }

    pub fn with_list_capacity(mut self, capacity: usize) -> Self {
        self.options.default_list_capacity = capacity;
        self
    }

    /// Adds a method to the entry points, after the configured ones.
    pub fn with_entry_point(mut self, method: &str) -> Self {
        if !self.options.entry_points.iter().any(|m| m == method) {
            self.options.entry_points.push(method.to_string());
        }
        self
    }

    pub fn with_max_inline_depth(mut self, depth: usize) -> Self {
        self.options.max_inline_depth = depth;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            class: self.class,
            options: self.options,
            resolver: self.resolver,
        }
    }
}

impl Compiler {
    pub fn builder(class: ClassInfo) -> CompilerBuilder {
        CompilerBuilder::new(class)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Lowers the class, resolves literal placeholders and validates the result.
    pub fn compile(self) -> Result<CompilationArtifacts, CompileError> {
        self.options.check()?;
        let validate_graph = self.options.validate;
        let name = self.class.name.clone();

        tracing::info!(class = %name, "[kumiki] Phase 1: lowering");
        let mut ctx = ExportContext::new(self.options).with_resolver(self.resolver);
        Walker::new(&mut ctx, &self.class).process()?;
        tracing::info!(
            nodes = ctx.graph().nodes.len(),
            variables = ctx.graph().variables.len(),
            events = ctx.graph().events.len(),
            diagnostics = ctx.diagnostics().len(),
            "[kumiki] Phase 1 complete"
        );

        tracing::info!("[kumiki] Phase 2: literal resolution");
        let rewritten = resolve_literals(&mut ctx);
        tracing::info!(sockets = rewritten, "[kumiki] Phase 2 complete");

        let (graph, diagnostics) = ctx.finish();

        let validation = if validate_graph {
            tracing::info!("[kumiki] Phase 3: validation");
            let report = validate(&graph);
            tracing::info!(findings = report.len(), "[kumiki] Phase 3 complete");
            report
        } else {
            ValidationReport::default()
        };

        #[cfg(feature = "debug-tools")]
        write_debug_file(
            &format!("tmp/{}_graph.txt", sanitize_filename(&name)),
            &DisplayGraph::new(&graph).to_string(),
        );

        Ok(CompilationArtifacts {
            name,
            graph,
            validation,
            diagnostics: diagnostics.into_vec(),
        })
    }
}

#[cfg(feature = "debug-tools")]
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
}

#[cfg(feature = "debug-tools")]
fn write_debug_file(path: &str, content: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            tracing::warn!(path, error = %e, "failed to create debug directory");
            return;
        }
    }
    if let Err(e) = fs::write(path, content) {
        tracing::warn!(path, error = %e, "failed to write debug file");
    }
}
