//! Builder-style handles for wiring sockets without touching raw node storage.
//!
//! A handle only names a socket. Every write goes through a `&mut` graph (or anything that
//! exposes one through [`AsMut<Graph>`], such as the export context), so handles can be
//! cloned freely and passed between subgraph builders.
//!
//! The only connection directions are [`ValueInRef::connect_to_source`] and
//! [`FlowOutRef::connect_to_flow_destination`]. Value outputs are never destinations.

use super::node::{NodeId, SocketAddress};
use super::value::{ConfigValue, ExpectedType, Literal, TypeRestriction};
use super::Graph;

/// Handle to a created node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(NodeId);

impl NodeRef {
    pub fn new(id: NodeId) -> Self {
        Self(id)
    }

    pub fn id(&self) -> NodeId {
        self.0
    }

    pub fn value_in(&self, name: &str) -> ValueInRef {
        ValueInRef::single(SocketAddress::new(self.0, name))
    }

    pub fn value_out(&self, name: &str) -> ValueOutRef {
        ValueOutRef(SocketAddress::new(self.0, name))
    }

    pub fn flow_in(&self, name: &str) -> FlowInRef {
        FlowInRef(SocketAddress::new(self.0, name))
    }

    pub fn flow_out(&self, name: &str) -> FlowOutRef {
        FlowOutRef(SocketAddress::new(self.0, name))
    }

    pub fn set_config<G: AsMut<Graph>>(&self, graph: &mut G, name: &str, value: ConfigValue) {
        match graph.as_mut().node_mut(self.0) {
            Some(node) => {
                node.configuration.insert(name.to_string(), Some(value));
            }
            None => tracing::warn!(node = %self.0, config = name, "configuration on unknown node"),
        }
    }
}

/// A value output. Supports any number of downstream connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueOutRef(SocketAddress);

impl ValueOutRef {
    pub fn address(&self) -> &SocketAddress {
        &self.0
    }

    pub fn node(&self) -> NodeId {
        self.0.node
    }

    pub fn socket(&self) -> &str {
        &self.0.socket
    }

    /// Annotates the declared type of this output. Placeholder outputs carry their type on
    /// the literal itself and ignore the annotation.
    pub fn expected_type<G: AsMut<Graph>>(&self, graph: &mut G, expected: ExpectedType) -> &Self {
        if self.0.node.is_placeholder() {
            return self;
        }
        match graph.as_mut().node_mut(self.0.node) {
            Some(node) => {
                node.values_out.entry(self.0.socket.clone()).or_default().expected =
                    Some(expected);
            }
            None => tracing::warn!(socket = %self.0, "type annotation on unknown node"),
        }
        self
    }
}

/// One logical value input, possibly linked to several physical sockets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueInRef {
    sockets: Vec<SocketAddress>,
}

impl ValueInRef {
    fn single(address: SocketAddress) -> Self {
        Self {
            sockets: vec![address],
        }
    }

    /// Merges several inputs into one that writes all of them at once.
    pub fn link<I: IntoIterator<Item = ValueInRef>>(inputs: I) -> Self {
        let mut sockets = Vec::new();
        for input in inputs {
            for address in input.sockets {
                if !sockets.contains(&address) {
                    sockets.push(address);
                }
            }
        }
        Self { sockets }
    }

    pub fn sockets(&self) -> &[SocketAddress] {
        &self.sockets
    }

    pub fn connect_to_source<G: AsMut<Graph>>(&self, graph: &mut G, source: &ValueOutRef) -> &Self {
        let graph = graph.as_mut();
        for address in &self.sockets {
            match graph.node_mut(address.node) {
                Some(node) => {
                    node.values_in.entry(address.socket.clone()).or_default().source =
                        Some(source.0.clone());
                }
                None => tracing::warn!(socket = %address, "connection into unknown node"),
            }
        }
        self
    }

    /// Stores a static literal. Mutually exclusive with [`Self::connect_to_source`].
    pub fn set_value<G: AsMut<Graph>>(&self, graph: &mut G, value: Literal) -> &Self {
        let graph = graph.as_mut();
        for address in &self.sockets {
            match graph.node_mut(address.node) {
                Some(node) => {
                    node.values_in.entry(address.socket.clone()).or_default().literal =
                        Some(value.clone());
                }
                None => tracing::warn!(socket = %address, "literal on unknown node"),
            }
        }
        self
    }

    pub fn set_type<G: AsMut<Graph>>(&self, graph: &mut G, restriction: TypeRestriction) -> &Self {
        let graph = graph.as_mut();
        for address in &self.sockets {
            if let Some(node) = graph.node_mut(address.node) {
                node.values_in.entry(address.socket.clone()).or_default().restriction =
                    Some(restriction.clone());
            }
        }
        self
    }
}

/// A flow output. Connects to at most one flow input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowOutRef(SocketAddress);

impl FlowOutRef {
    pub fn address(&self) -> &SocketAddress {
        &self.0
    }

    pub fn node(&self) -> NodeId {
        self.0.node
    }

    pub fn socket(&self) -> &str {
        &self.0.socket
    }

    /// Connects this output to `destination`. A second, different destination is recorded
    /// alongside the first so validation can report the fan-out.
    pub fn connect_to_flow_destination<G: AsMut<Graph>>(
        &self,
        graph: &mut G,
        destination: &FlowInRef,
    ) -> &Self {
        let graph = graph.as_mut();
        match graph.node_mut(self.0.node) {
            Some(node) => {
                let output = node.flows_out.entry(self.0.socket.clone()).or_default();
                if !output.targets.contains(&destination.0) {
                    if !output.targets.is_empty() {
                        tracing::warn!(socket = %self.0, "flow output already connected");
                    }
                    output.targets.push(destination.0.clone());
                }
            }
            None => tracing::warn!(socket = %self.0, "flow connection from unknown node"),
        }
        if let Some(target) = graph.node_mut(destination.0.node) {
            target.flows_in.insert(destination.0.socket.clone());
        }
        self
    }
}

/// A flow input. Any number of flow outputs may target it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowInRef(SocketAddress);

impl FlowInRef {
    pub fn address(&self) -> &SocketAddress {
        &self.0
    }

    pub fn node(&self) -> NodeId {
        self.0.node
    }
}
