pub mod display;
pub mod node;
pub mod op;
pub mod refs;
pub mod value;

pub use display::*;
pub use node::*;
pub use op::*;
pub use refs::*;
pub use value::*;

use serde::{Deserialize, Serialize};

pub type VariableId = usize;
pub type EventId = usize;

/// A globally scoped, typed storage cell. Its id is its position in [`Graph::variables`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value_type: ValueType,
    pub initial: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventValue {
    pub name: String,
    pub value_type: ValueType,
}

/// A named signal carrying an ordered list of typed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub name: String,
    pub values: Vec<EventValue>,
}

/// The node graph produced by lowering one compiled unit.
///
/// Nodes are kept in creation order, which is also ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub variables: Vec<Variable>,
    pub events: Vec<CustomEvent>,
}

impl Graph {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .binary_search_by_key(&id, |n| n.index)
            .ok()
            .map(|pos| &self.nodes[pos])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match self.nodes.binary_search_by_key(&id, |n| n.index) {
            Ok(pos) => Some(&mut self.nodes[pos]),
            Err(_) => None,
        }
    }

    pub fn nodes_with_op(&self, op: Op) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.op == op)
    }

    pub fn count_op(&self, op: Op) -> usize {
        self.nodes_with_op(op).count()
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id)
    }

    pub fn variable_by_name(&self, name: &str) -> Option<(VariableId, &Variable)> {
        self.variables.iter().enumerate().find(|(_, v)| v.name == name)
    }

    pub fn event(&self, id: EventId) -> Option<&CustomEvent> {
        self.events.get(id)
    }

    /// Resolves the flow target of `node.socket` to the node it points at.
    pub fn flow_successor(&self, node: NodeId, socket: &str) -> Option<&Node> {
        self.node(node)?
            .flow_target(socket)
            .and_then(|target| self.node(target.node))
    }

    /// Resolves the source node feeding `node.socket`.
    pub fn value_source(&self, node: NodeId, socket: &str) -> Option<&Node> {
        self.node(node)?
            .value_in(socket)?
            .source
            .as_ref()
            .and_then(|src| self.node(src.node))
    }
}

impl AsMut<Graph> for Graph {
    fn as_mut(&mut self) -> &mut Graph {
        self
    }
}

impl AsRef<Graph> for Graph {
    fn as_ref(&self) -> &Graph {
        self
    }
}
