use super::op::{Op, OutputType};
use super::value::{ConfigValue, ExpectedType, Literal, TypeRestriction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable node identity. Indices at or above [`NodeId::PLACEHOLDER_BASE`] belong to
/// literal placeholders and never name a real node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const PLACEHOLDER_BASE: u32 = 1 << 30;

    pub fn is_placeholder(&self) -> bool {
        self.0 >= Self::PLACEHOLDER_BASE
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_placeholder() {
            write!(f, "#lit{}", self.0 - Self::PLACEHOLDER_BASE)
        } else {
            write!(f, "#{:04}", self.0)
        }
    }
}

/// A named socket on a specific node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketAddress {
    pub node: NodeId,
    pub socket: String,
}

impl SocketAddress {
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.socket)
    }
}

/// A value input. Sound graphs set exactly one of `literal` and `source`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueInput {
    pub literal: Option<Literal>,
    pub source: Option<SocketAddress>,
    pub restriction: Option<TypeRestriction>,
}

impl ValueInput {
    pub fn is_dangling(&self) -> bool {
        self.literal.is_none() && self.source.is_none()
    }

    pub fn is_conflicting(&self) -> bool {
        self.literal.is_some() && self.source.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueOutput {
    pub expected: Option<ExpectedType>,
}

/// A flow output. More than one target is a fan-out violation reported by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowOutput {
    pub targets: Vec<SocketAddress>,
}

impl FlowOutput {
    pub fn target(&self) -> Option<&SocketAddress> {
        self.targets.first()
    }
}

/// An operation instance in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub index: NodeId,
    pub op: Op,
    pub configuration: BTreeMap<String, Option<ConfigValue>>,
    pub values_in: BTreeMap<String, ValueInput>,
    pub values_out: BTreeMap<String, ValueOutput>,
    pub flows_in: BTreeSet<String>,
    pub flows_out: BTreeMap<String, FlowOutput>,
}

impl Node {
    /// Creates a node with every statically declared socket and configuration key present.
    pub fn new(index: NodeId, op: Op) -> Self {
        let schema = op.schema();
        let configuration = schema
            .config
            .iter()
            .map(|name| (name.to_string(), None))
            .collect();
        let values_in = schema
            .values_in
            .iter()
            .map(|name| (name.to_string(), ValueInput::default()))
            .collect();
        let values_out = schema
            .values_out
            .iter()
            .map(|(name, ty)| {
                let expected = match ty {
                    OutputType::Exact(t) => Some(ExpectedType::Exact(*t)),
                    OutputType::SameAsInput(input) => {
                        Some(ExpectedType::FromInput(input.to_string()))
                    }
                    OutputType::Assigned => None,
                };
                (name.to_string(), ValueOutput { expected })
            })
            .collect();
        let flows_in = schema.flows_in.iter().map(|s| s.to_string()).collect();
        let flows_out = schema
            .flows_out
            .iter()
            .map(|name| (name.to_string(), FlowOutput::default()))
            .collect();

        Self {
            index,
            op,
            configuration,
            values_in,
            values_out,
            flows_in,
            flows_out,
        }
    }

    pub fn config(&self, name: &str) -> Option<&ConfigValue> {
        self.configuration.get(name).and_then(|v| v.as_ref())
    }

    pub fn value_in(&self, name: &str) -> Option<&ValueInput> {
        self.values_in.get(name)
    }

    pub fn flow_target(&self, name: &str) -> Option<&SocketAddress> {
        self.flows_out.get(name).and_then(|f| f.target())
    }
}
