//! The node-exporter context: owner of the graph under construction.
//!
//! Every subgraph builder and the walker go through one `ExportContext`. It hands out node
//! indices in creation order, interns variables and events by name, and keeps the literal
//! placeholders that stand in for compile-time constants until literal resolution runs.

use crate::compiler::CompilerOptions;
use crate::diagnostics::Diagnostics;
use crate::graph::{
    CustomEvent, EventId, EventValue, Graph, Literal, Node, NodeId, NodeRef, Op, ValueOutRef,
    ValueType, Variable, VariableId,
};
use ahash::AHashMap;

mod resolver;

pub use resolver::*;

pub struct ExportContext {
    graph: Graph,
    next_index: u32,
    next_placeholder: u32,
    placeholders: AHashMap<NodeId, Option<Literal>>,
    variable_ids: AHashMap<String, VariableId>,
    event_ids: AHashMap<String, EventId>,
    name_counters: AHashMap<String, u32>,
    resolver: Box<dyn AddressResolver>,
    options: CompilerOptions,
    diagnostics: Diagnostics,
}

impl ExportContext {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            graph: Graph::default(),
            next_index: 0,
            next_placeholder: NodeId::PLACEHOLDER_BASE,
            placeholders: AHashMap::new(),
            variable_ids: AHashMap::new(),
            event_ids: AHashMap::new(),
            name_counters: AHashMap::new(),
            resolver: Box::new(StaticResolver::new()),
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn AddressResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Consumes the context, returning the graph and the collected diagnostics.
    pub fn finish(self) -> (Graph, Diagnostics) {
        (self.graph, self.diagnostics)
    }

    /// Creates a node whose index is strictly greater than every index handed out before.
    pub fn create_node(&mut self, op: Op) -> NodeRef {
        let id = NodeId(self.next_index);
        self.next_index += 1;
        self.graph.nodes.push(Node::new(id, op));
        NodeRef::new(id)
    }

    /// Creates a placeholder output standing in for `value` until literal resolution.
    pub fn create_literal(&mut self, value: Literal) -> ValueOutRef {
        self.allocate_placeholder(Some(value))
    }

    /// Creates a placeholder for a constant that could not be discovered. Literal resolution
    /// leaves every socket fed by it disconnected.
    pub fn create_unresolved_literal(&mut self) -> ValueOutRef {
        self.allocate_placeholder(None)
    }

    fn allocate_placeholder(&mut self, value: Option<Literal>) -> ValueOutRef {
        let id = NodeId(self.next_placeholder);
        self.next_placeholder += 1;
        self.placeholders.insert(id, value);
        NodeRef::new(id).value_out("value")
    }

    /// Returns the constant behind a placeholder output, if it is one and it has a value.
    pub fn placeholder_value(&self, output: &ValueOutRef) -> Option<&Literal> {
        self.placeholders
            .get(&output.node())
            .and_then(|value| value.as_ref())
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }

    /// Hands the placeholder table to literal resolution and clears all placeholder state.
    pub fn take_placeholders(&mut self) -> AHashMap<NodeId, Option<Literal>> {
        self.next_placeholder = NodeId::PLACEHOLDER_BASE;
        std::mem::take(&mut self.placeholders)
    }

    /// Interns a variable by name. Repeated calls with the same name return the same id and
    /// leave the first declaration untouched.
    pub fn add_variable_with_id_if_needed(
        &mut self,
        name: &str,
        initial: Option<Literal>,
        value_type: ValueType,
    ) -> VariableId {
        let variables = &mut self.graph.variables;
        *self
            .variable_ids
            .entry(name.to_string())
            .or_insert_with(|| {
                variables.push(Variable {
                    name: name.to_string(),
                    value_type,
                    initial,
                });
                variables.len() - 1
            })
    }

    pub fn variable_id(&self, name: &str) -> Option<VariableId> {
        self.variable_ids.get(name).copied()
    }

    /// Replaces the initial value of a declared variable.
    pub fn set_variable_initial(&mut self, id: VariableId, initial: Option<Literal>) {
        if let Some(variable) = self.graph.variables.get_mut(id) {
            variable.initial = initial;
        }
    }

    /// Interns a custom event by name, with the same contract as variables.
    pub fn add_event_with_id_if_needed(&mut self, name: &str, values: Vec<EventValue>) -> EventId {
        let events = &mut self.graph.events;
        *self.event_ids.entry(name.to_string()).or_insert_with(|| {
            events.push(CustomEvent {
                name: name.to_string(),
                values,
            });
            events.len() - 1
        })
    }

    pub fn event_id(&self, name: &str) -> Option<EventId> {
        self.event_ids.get(name).copied()
    }

    /// Maps a host object to its target id through the configured resolver.
    pub fn resolve_object(&self, object: &ObjectRef) -> Option<u32> {
        self.resolver.resolve(object)
    }

    /// Returns `prefix_N` with a per-prefix counter, for synthesized variable names.
    pub fn unique_name(&mut self, prefix: &str) -> String {
        let counter = self.name_counters.entry(prefix.to_string()).or_insert(0);
        let name = format!("{}_{}", prefix, counter);
        *counter += 1;
        name
    }
}

impl AsMut<Graph> for ExportContext {
    fn as_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }
}

impl AsRef<Graph> for ExportContext {
    fn as_ref(&self) -> &Graph {
        &self.graph
    }
}
