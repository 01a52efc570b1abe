//! Structural validation of a finished graph.
//!
//! The pass is read-only and never stops early: every problem found becomes one [`Finding`]
//! in the returned [`ValidationReport`].

use crate::graph::{
    ConfigValue, DynamicSockets, ExpectedType, Graph, Literal, Node, NodeId, Op, SocketAddress,
    TypeRestriction, ValueType, template_placeholders,
};
use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    MissingConfiguration,
    UndeclaredSocket,
    DanglingInput,
    ConflictingInput,
    BrokenConnection,
    PlaceholderConnection,
    UnresolvedType,
    TypeMismatch,
    BrokenFlow,
    FlowFanOut,
    MissingTemplateInput,
    InvalidNodeIndex,
    UnknownVariable,
    UnknownEvent,
    MissingCasePort,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FindingKind::MissingConfiguration => "missing configuration",
            FindingKind::UndeclaredSocket => "undeclared socket",
            FindingKind::DanglingInput => "dangling input",
            FindingKind::ConflictingInput => "conflicting input",
            FindingKind::BrokenConnection => "broken connection",
            FindingKind::PlaceholderConnection => "placeholder connection",
            FindingKind::UnresolvedType => "unresolved type",
            FindingKind::TypeMismatch => "type mismatch",
            FindingKind::BrokenFlow => "broken flow",
            FindingKind::FlowFanOut => "flow fan-out",
            FindingKind::MissingTemplateInput => "missing template input",
            FindingKind::InvalidNodeIndex => "invalid node index",
            FindingKind::UnknownVariable => "unknown variable",
            FindingKind::UnknownEvent => "unknown event",
            FindingKind::MissingCasePort => "missing case port",
        };
        write!(f, "{}", name)
    }
}

/// One structural problem, located by node and, where it applies, socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub node: NodeId,
    pub op: Op,
    pub socket: Option<String>,
    pub kind: FindingKind,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] node {} ({})", self.kind, self.node, self.op)?;
        if let Some(socket) = &self.socket {
            write!(f, " .{}", socket)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter()
    }

    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.node == node)
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "Graph is valid.");
        }
        writeln!(f, "{} finding(s):", self.findings.len())?;
        for finding in &self.findings {
            writeln!(f, "  {}", finding)?;
        }
        Ok(())
    }
}

/// Outcome of resolving the type carried by a value output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeLookup {
    Known(ValueType),
    /// No declaration determines the type.
    Undetermined,
    /// Depends on an input that is itself broken and reported on its own.
    Blocked,
}

/// Checks every node of `graph` and returns all findings.
pub fn validate(graph: &Graph) -> ValidationReport {
    let mut validator = Validator {
        graph,
        findings: Vec::new(),
    };
    for node in &graph.nodes {
        validator.check_node(node);
    }
    tracing::debug!(nodes = graph.nodes.len(), findings = validator.findings.len(), "validation finished");
    ValidationReport {
        findings: validator.findings,
    }
}

struct Validator<'g> {
    graph: &'g Graph,
    findings: Vec<Finding>,
}

impl<'g> Validator<'g> {
    fn report(&mut self, node: &Node, socket: Option<&str>, kind: FindingKind, message: impl Into<String>) {
        self.findings.push(Finding {
            node: node.index,
            op: node.op,
            socket: socket.map(str::to_string),
            kind,
            message: message.into(),
        });
    }

    fn check_node(&mut self, node: &Node) {
        self.check_configuration(node);
        self.check_declared_sockets(node);
        self.check_value_inputs(node);
        self.check_flow_outputs(node);
        match node.op {
            Op::PointerGet | Op::PointerSet => self.check_pointer(node),
            Op::VariableGet | Op::VariableSet => self.check_variable(node),
            Op::EventReceive | Op::EventSend => self.check_event(node),
            Op::DebugLog => self.check_message(node),
            Op::FlowSwitch | Op::MathSwitch => self.check_cases(node),
            _ => {}
        }
    }

    fn check_configuration(&mut self, node: &Node) {
        for (name, value) in &node.configuration {
            if value.is_none() {
                self.report(node, Some(name.as_str()), FindingKind::MissingConfiguration, "configuration has no value");
            }
        }
    }

    fn check_declared_sockets(&mut self, node: &Node) {
        let schema = node.op.schema();
        let dynamic = schema.dynamic;
        let template = node.config("pointer").and_then(ConfigValue::as_text);
        let message = node.config("message").and_then(ConfigValue::as_text);
        let event_values = self.event_value_names(node);

        for name in node.values_in.keys() {
            let declared = schema.values_in.contains(&name.as_str())
                || match dynamic {
                    DynamicSockets::NumberedValueInputs => is_number(name),
                    DynamicSockets::TemplateValueInputs => {
                        template.is_some_and(|t| template_placeholders(t).contains(name))
                    }
                    DynamicSockets::MessageValueInputs => {
                        message.is_some_and(|m| template_placeholders(m).contains(name))
                    }
                    DynamicSockets::EventValueInputs => event_values.contains(name),
                    _ => false,
                };
            if !declared {
                self.report(node, Some(name.as_str()), FindingKind::UndeclaredSocket, "value input not declared by the operation");
            }
        }
        for name in node.values_out.keys() {
            let declared = schema.values_out.iter().any(|(n, _)| *n == name.as_str())
                || (dynamic == DynamicSockets::EventValueOutputs && event_values.contains(name));
            if !declared {
                self.report(node, Some(name.as_str()), FindingKind::UndeclaredSocket, "value output not declared by the operation");
            }
        }
        for name in &node.flows_in {
            let declared = schema.flows_in.contains(&name.as_str())
                || (dynamic == DynamicSockets::NumberedFlowInputs && is_number(name));
            if !declared {
                self.report(node, Some(name.as_str()), FindingKind::UndeclaredSocket, "flow input not declared by the operation");
            }
        }
        for name in node.flows_out.keys() {
            let declared = schema.flows_out.contains(&name.as_str())
                || (dynamic == DynamicSockets::NumberedFlowOutputs && is_number(name));
            if !declared {
                self.report(node, Some(name.as_str()), FindingKind::UndeclaredSocket, "flow output not declared by the operation");
            }
        }
    }

    fn event_value_names(&self, node: &Node) -> Vec<String> {
        if !matches!(node.op, Op::EventReceive | Op::EventSend) {
            return Vec::new();
        }
        node.config("event")
            .and_then(ConfigValue::as_int)
            .and_then(|id| usize::try_from(id).ok())
            .and_then(|id| self.graph.event(id))
            .map(|event| event.values.iter().map(|v| v.name.clone()).collect())
            .unwrap_or_default()
    }

    fn check_value_inputs(&mut self, node: &Node) {
        for (name, input) in &node.values_in {
            if input.is_dangling() {
                self.report(node, Some(name.as_str()), FindingKind::DanglingInput, "input has neither a literal nor a connection");
                continue;
            }
            if input.is_conflicting() {
                self.report(node, Some(name.as_str()), FindingKind::ConflictingInput, "input has both a literal and a connection");
                continue;
            }

            let actual = match (&input.literal, &input.source) {
                (Some(literal), _) => TypeLookup::Known(literal.value_type()),
                (None, Some(source)) => {
                    if let Some(problem) = self.connection_problem(source) {
                        let kind = if source.node.is_placeholder() {
                            FindingKind::PlaceholderConnection
                        } else {
                            FindingKind::BrokenConnection
                        };
                        self.report(node, Some(name.as_str()), kind, problem);
                        continue;
                    }
                    let lookup = self.output_type(source, &mut AHashSet::new());
                    if lookup == TypeLookup::Undetermined {
                        self.report(
                            node,
                            Some(name.as_str()),
                            FindingKind::UnresolvedType,
                            format!("type of source {} cannot be resolved", source),
                        );
                        continue;
                    }
                    lookup
                }
                (None, None) => continue,
            };

            let TypeLookup::Known(actual) = actual else {
                continue;
            };
            if let Some(restriction) = &input.restriction {
                let expected = self.restriction_types(node, restriction);
                if let Some(expected) = expected {
                    if !expected.contains(&actual) {
                        self.report(
                            node,
                            Some(name.as_str()),
                            FindingKind::TypeMismatch,
                            format!(
                                "got {}, expected {}",
                                actual,
                                expected.iter().map(ValueType::name).join(" or ")
                            ),
                        );
                    }
                }
            }
        }
    }

    /// Why a connection does not reach an existing value output, if it does not.
    fn connection_problem(&self, source: &SocketAddress) -> Option<String> {
        if source.node.is_placeholder() {
            return Some(format!("connected to literal placeholder {}", source.node));
        }
        let Some(upstream) = self.graph.node(source.node) else {
            return Some(format!("connected to missing node {}", source.node));
        };
        if !upstream.values_out.contains_key(&source.socket) {
            return Some(format!("connected to missing output {}", source));
        }
        None
    }

    fn restriction_types(&self, node: &Node, restriction: &TypeRestriction) -> Option<Vec<ValueType>> {
        match restriction {
            TypeRestriction::Only(ty) => Some(vec![*ty]),
            TypeRestriction::OneOf(types) => Some(types.clone()),
            TypeRestriction::SameAsInput(other) => match self.input_type(node, other, &mut AHashSet::new()) {
                TypeLookup::Known(ty) => Some(vec![ty]),
                _ => None,
            },
        }
    }

    fn input_type(&self, node: &Node, name: &str, visited: &mut AHashSet<SocketAddress>) -> TypeLookup {
        let Some(input) = node.value_in(name) else {
            return TypeLookup::Blocked;
        };
        match (&input.literal, &input.source) {
            (Some(literal), None) => TypeLookup::Known(literal.value_type()),
            (None, Some(source)) => {
                if self.connection_problem(source).is_some() {
                    return TypeLookup::Blocked;
                }
                self.output_type(source, visited)
            }
            _ => TypeLookup::Blocked,
        }
    }

    fn output_type(&self, source: &SocketAddress, visited: &mut AHashSet<SocketAddress>) -> TypeLookup {
        if !visited.insert(source.clone()) {
            return TypeLookup::Undetermined;
        }
        let Some(upstream) = self.graph.node(source.node) else {
            return TypeLookup::Blocked;
        };
        let expected = upstream
            .values_out
            .get(&source.socket)
            .and_then(|output| output.expected.as_ref());
        match expected {
            Some(ExpectedType::Exact(ty)) => TypeLookup::Known(*ty),
            Some(ExpectedType::FromInput(input)) => self.input_type(upstream, input, visited),
            None => TypeLookup::Undetermined,
        }
    }

    fn check_flow_outputs(&mut self, node: &Node) {
        for (name, output) in &node.flows_out {
            if output.targets.len() > 1 {
                self.report(
                    node,
                    Some(name.as_str()),
                    FindingKind::FlowFanOut,
                    format!("{} destinations: {}", output.targets.len(), output.targets.iter().join(", ")),
                );
            }
            for target in &output.targets {
                let problem = match self.graph.node(target.node) {
                    None => Some(format!("points at missing node {}", target.node)),
                    Some(next) if !next.flows_in.contains(&target.socket) => {
                        Some(format!("points at undeclared flow input {}", target))
                    }
                    Some(_) => None,
                };
                if let Some(problem) = problem {
                    self.report(node, Some(name.as_str()), FindingKind::BrokenFlow, problem);
                }
            }
        }
    }

    fn check_pointer(&mut self, node: &Node) {
        let Some(template) = node.config("pointer").and_then(ConfigValue::as_text) else {
            return;
        };
        for name in template_placeholders(template) {
            let Some(input) = node.value_in(&name) else {
                self.report(
                    node,
                    Some(name.as_str()),
                    FindingKind::MissingTemplateInput,
                    format!("pointer token '{{{}}}' has no socket", name),
                );
                continue;
            };
            if name != "nodeIndex" {
                continue;
            }
            match &input.literal {
                Some(Literal::Int(id)) if *id >= 0 => {}
                Some(other) => self.report(
                    node,
                    Some(name.as_str()),
                    FindingKind::InvalidNodeIndex,
                    format!("node index must be a non-negative int, got {}", other),
                ),
                None => {}
            }
        }
    }

    fn check_variable(&mut self, node: &Node) {
        let id = node.config("variable").and_then(ConfigValue::as_int);
        let known = id
            .and_then(|id| usize::try_from(id).ok())
            .is_some_and(|id| self.graph.variable(id).is_some());
        if let (Some(id), false) = (id, known) {
            self.report(node, Some("variable"), FindingKind::UnknownVariable, format!("variable {} is not declared", id));
        }
    }

    fn check_event(&mut self, node: &Node) {
        let id = node.config("event").and_then(ConfigValue::as_int);
        let known = id
            .and_then(|id| usize::try_from(id).ok())
            .is_some_and(|id| self.graph.event(id).is_some());
        if let (Some(id), false) = (id, known) {
            self.report(node, Some("event"), FindingKind::UnknownEvent, format!("event {} is not declared", id));
        }
    }

    fn check_message(&mut self, node: &Node) {
        let Some(message) = node.config("message").and_then(ConfigValue::as_text) else {
            return;
        };
        for name in template_placeholders(message) {
            if node.value_in(&name).is_none() {
                self.report(
                    node,
                    Some(name.as_str()),
                    FindingKind::MissingTemplateInput,
                    format!("message token '{{{}}}' has no value input", name),
                );
            }
        }
    }

    fn check_cases(&mut self, node: &Node) {
        let Some(cases) = node.config("cases").and_then(ConfigValue::as_int_list) else {
            return;
        };
        for case in cases {
            let port = case.to_string();
            let present = match node.op {
                Op::FlowSwitch => node.flows_out.contains_key(&port),
                _ => node.values_in.contains_key(&port),
            };
            if !present {
                self.report(node, Some(port.as_str()), FindingKind::MissingCasePort, format!("case {} has no port", case));
            }
        }
    }
}

fn is_number(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}
