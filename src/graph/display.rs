use super::Graph;
use super::node::Node;
use itertools::Itertools;
use std::fmt;

/// Tree-style dump of a graph for debugging output and the CLI.
pub struct DisplayGraph<'a> {
    pub graph: &'a Graph,
}

impl<'a> DisplayGraph<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    fn fmt_node(&self, node: &Node, f: &mut fmt::Formatter<'_>, is_last: bool) -> fmt::Result {
        let marker = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };
        writeln!(f, "{}{} {}", marker, node.index, node.op)?;

        let mut lines = Vec::new();
        for (name, value) in &node.configuration {
            match value {
                Some(v) => lines.push(format!("config {} = {}", name, v)),
                None => lines.push(format!("config {} = <absent>", name)),
            }
        }
        for (name, input) in &node.values_in {
            let source = match (&input.literal, &input.source) {
                (Some(lit), None) => format!("= {}", lit),
                (None, Some(src)) => format!("<- {}", src),
                (Some(lit), Some(src)) => format!("= {} <- {} (conflict)", lit, src),
                (None, None) => "<dangling>".to_string(),
            };
            lines.push(format!("in  {} {}", name, source));
        }
        for (name, output) in &node.values_out {
            match &output.expected {
                Some(expected) => lines.push(format!("out {} : {:?}", name, expected)),
                None => lines.push(format!("out {}", name)),
            }
        }
        for (name, flow) in &node.flows_out {
            if !flow.targets.is_empty() {
                lines.push(format!(
                    "flow {} -> {}",
                    name,
                    flow.targets.iter().map(|t| t.to_string()).join(", ")
                ));
            }
        }

        let count = lines.len();
        for (i, line) in lines.into_iter().enumerate() {
            let line_marker = if i + 1 == count { "└── " } else { "├── " };
            writeln!(f, "{}{}{}", child_prefix, line_marker, line)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for DisplayGraph<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph: {} nodes, {} variables, {} events",
            self.graph.nodes.len(),
            self.graph.variables.len(),
            self.graph.events.len()
        )?;

        for (id, variable) in self.graph.variables.iter().enumerate() {
            let initial = variable
                .initial
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "var {:>3} {} : {} = {}",
                id, variable.name, variable.value_type, initial
            )?;
        }
        for (id, event) in self.graph.events.iter().enumerate() {
            writeln!(
                f,
                "event {:>3} {}({})",
                id,
                event.name,
                event
                    .values
                    .iter()
                    .map(|v| format!("{}: {}", v.name, v.value_type))
                    .join(", ")
            )?;
        }

        let count = self.graph.nodes.len();
        for (i, node) in self.graph.nodes.iter().enumerate() {
            self.fmt_node(node, f, i + 1 == count)?;
        }
        Ok(())
    }
}
