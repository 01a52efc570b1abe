//! Lowering of a reflected class into the node graph.
//!
//! The [`Walker`] threads a flow output through every statement of every entry method. Each
//! statement consumes the flow it is given and reports where control leaves it (see
//! [`Exits`]). Expressions lower to value outputs and never touch flow, with the exception of
//! invocations that have flow effects (delays, inlined calls), which the statement layer
//! sequences explicitly.

pub mod ast;
pub mod builtins;
mod expressions;
mod invocation;
mod loops;
mod statements;

pub use ast::*;
pub use builtins::{Builtin, BuiltinProperty, LogSeverity, value_type_of};

use crate::builders::VariableBasedList;
use crate::builders::flow::TickChain;
use crate::builders::variables::set_variable_from;
use crate::error::{CompileError, LiteralError};
use crate::export::{ExportContext, ObjectRef};
use crate::graph::{
    ConfigValue, EventValue, ExpectedType, FlowOutRef, Literal, NodeRef, Op, ValueOutRef,
    ValueType, VariableId,
};
use ahash::{AHashMap, AHashSet};

/// Where control leaves a lowered statement or block.
///
/// `open` flows continue with the next statement; more than one means the statement forked
/// and the block walker has to join them. An empty `open` is the no-rejoin case. `returned`
/// flows left the enclosing method through a `return`.
#[derive(Debug, Clone, Default)]
pub struct Exits {
    pub open: Vec<FlowOutRef>,
    pub returned: Vec<FlowOutRef>,
}

impl Exits {
    pub fn open(flow: FlowOutRef) -> Self {
        Self {
            open: vec![flow],
            returned: Vec::new(),
        }
    }

    pub fn returned(flow: FlowOutRef) -> Self {
        Self {
            open: Vec::new(),
            returned: vec![flow],
        }
    }

    pub fn merge(&mut self, other: Exits) {
        self.open.extend(other.open);
        self.returned.extend(other.returned);
    }

    /// Every flow that leaves, open or returned.
    pub fn tails(self) -> Vec<FlowOutRef> {
        let mut tails = self.open;
        tails.extend(self.returned);
        tails
    }
}

/// Per-method lowering state.
#[derive(Debug, Default)]
struct Frame {
    method: String,
    /// Parameters, event values and native loop indices: names bound to a value output.
    bindings: AHashMap<String, ValueOutRef>,
    /// Locals backed by a variable named `{method}_{local}`.
    locals: AHashMap<String, VariableId>,
    return_variable: Option<VariableId>,
}

pub struct Walker<'a> {
    ctx: &'a mut ExportContext,
    class: &'a ClassInfo,
    fields: AHashMap<String, VariableId>,
    lists: AHashMap<String, VariableBasedList>,
    frames: Vec<Frame>,
    tick: Option<TickChain>,
    inline_stack: Vec<String>,
}

impl<'a> Walker<'a> {
    pub fn new(ctx: &'a mut ExportContext, class: &'a ClassInfo) -> Self {
        Self {
            ctx,
            class,
            fields: AHashMap::new(),
            lists: AHashMap::new(),
            frames: Vec::new(),
            tick: None,
            inline_stack: Vec::new(),
        }
    }

    /// Lowers the whole class: fields first, then every configured entry point.
    ///
    /// Fails only when none of the configured entry points exists on the class.
    pub fn process(mut self) -> Result<(), CompileError> {
        self.declare_fields();

        let class = self.class;
        let entry_points = self.ctx.options().entry_points.clone();
        let mut wired = 0;
        for name in &entry_points {
            let Some(method) = class.method(name) else {
                tracing::debug!(class = %class.name, method = %name, "entry point not defined");
                continue;
            };
            self.lower_entry_point(method);
            wired += 1;
        }

        if wired == 0 {
            tracing::error!(class = %self.class.name, "no entry point to lower");
            return Err(CompileError::NoEntryPoints {
                class: self.class.name.clone(),
                entry_points,
            });
        }
        Ok(())
    }

    fn lower_entry_point(&mut self, method: &'a MethodInfo) {
        tracing::debug!(method = %method.name, statements = method.body.len(), "lowering entry point");
        self.ctx.diagnostics_mut().set_method(&method.name);
        let mut frame = Frame {
            method: method.name.clone(),
            ..Frame::default()
        };

        let flow = match method.name.as_str() {
            "Start" => self.ctx.create_node(Op::EventOnStart).flow_out("out"),
            "Update" => self.tick_flow(),
            _ => {
                let receive = self.event_receiver(method);
                for parameter in &method.parameters {
                    let output = receive.value_out(&parameter.name);
                    if let Some(ty) = self.parameter_type(&parameter.param_type) {
                        output.expected_type(self.ctx, ExpectedType::Exact(ty));
                    }
                    frame.bindings.insert(parameter.name.clone(), output);
                }
                receive.flow_out("out")
            }
        };

        self.frames.push(frame);
        let flow = self.copy_parameters(method, false, flow);
        let exits = self.walk_block(&method.body, flow);
        self.frames.pop();
        tracing::debug!(
            method = %method.name,
            open = exits.open.len(),
            returned = exits.returned.len(),
            "entry point lowered"
        );
    }

    /// Copies bound parameters into locals of the current frame, each seeded with the passed
    /// value before the body runs. Reads and writes then share the local.
    ///
    /// Parameters the body assigns to are always copied. With `all`, every argument that is
    /// not a compile-time constant is copied too, so the callee sees the value at call entry.
    fn copy_parameters(&mut self, method: &MethodInfo, all: bool, mut flow: FlowOutRef) -> FlowOutRef {
        let written = assigned_names(&method.body);
        for parameter in &method.parameters {
            let name = parameter.name.as_str();
            let Some(bound) = self.frame().and_then(|f| f.bindings.get(name).cloned()) else {
                continue;
            };
            if !written.contains(name) && !(all && !bound.node().is_placeholder()) {
                continue;
            }
            let Some(ty) = self.parameter_type(&parameter.param_type) else {
                continue;
            };
            let id = self.declare_local(name, ty);
            let seed = set_variable_from(self.ctx, id, &bound);
            flow.connect_to_flow_destination(self.ctx, &seed.flow_in);
            flow = seed.flow_out;
        }
        flow
    }

    /// Declares the custom event carrying `method`'s parameters and creates its receiver.
    fn event_receiver(&mut self, method: &MethodInfo) -> NodeRef {
        let values = method
            .parameters
            .iter()
            .filter_map(|p| {
                self.parameter_type(&p.param_type).map(|ty| EventValue {
                    name: p.name.clone(),
                    value_type: ty,
                })
            })
            .collect();
        let event = self.ctx.add_event_with_id_if_needed(&method.name, values);
        let receive = self.ctx.create_node(Op::EventReceive);
        receive.set_config(self.ctx, "event", ConfigValue::Int(event as i32));
        receive
    }

    /// Value type of a parameter or local. Object references travel as integer target ids.
    fn parameter_type(&self, ty: &TypeRef) -> Option<ValueType> {
        value_type_of(ty).or_else(|| builtins::is_object_type(ty).then_some(ValueType::Int))
    }

    /// Declares scalar fields as variables and list fields as variable-based lists.
    fn declare_fields(&mut self) {
        let class = self.class;
        self.ctx.diagnostics_mut().set_method(&class.name);
        for field in &class.fields {
            if let Some(element) = field.field_type.element_type() {
                self.declare_list(field, &element);
                continue;
            }
            if builtins::is_object_type(&field.field_type) {
                // Resolved through the address resolver at each use.
                continue;
            }
            let Some(ty) = value_type_of(&field.field_type) else {
                self.ctx.diagnostics_mut().unsupported(format!(
                    "field '{}' has unsupported type '{}'",
                    field.name,
                    field.field_type.full_name()
                ));
                continue;
            };
            let initial = field
                .initializer
                .as_ref()
                .and_then(|e| constant(e, Some(ty)))
                .unwrap_or_else(|| ty.default_literal());
            let id = self
                .ctx
                .add_variable_with_id_if_needed(&field.name, Some(initial), ty);
            self.fields.insert(field.name.clone(), id);
        }
    }

    fn declare_list(&mut self, field: &FieldInfo, element: &TypeRef) {
        let Some(ty) = value_type_of(element) else {
            self.ctx.diagnostics_mut().unsupported(format!(
                "list field '{}' has unsupported element type '{}'",
                field.name,
                element.full_name()
            ));
            return;
        };
        let capacity = field
            .capacity
            .unwrap_or(self.ctx.options().default_list_capacity);
        let list = VariableBasedList::new(self.ctx, ty, capacity);

        let items = field
            .initializer
            .as_ref()
            .map(|init| init.children.as_slice())
            .unwrap_or_default();
        for item in items {
            let Some(value) = constant(item, Some(ty)) else {
                self.ctx.diagnostics_mut().unsupported(format!(
                    "initializer item of list '{}' is not a constant",
                    field.name
                ));
                continue;
            };
            if let Err(e) = list.add_item(self.ctx, value) {
                self.ctx.diagnostics_mut().malformed(e.to_string());
                break;
            }
        }
        self.lists.insert(field.name.clone(), list);
    }

    /// The shared tick event node, created on first use.
    fn tick_node(&mut self) -> NodeRef {
        self.tick.get_or_insert_with(|| TickChain::new(self.ctx)).event()
    }

    /// A flow output of its own behind the shared tick event.
    fn tick_flow(&mut self) -> FlowOutRef {
        let chain = self.tick.get_or_insert_with(|| TickChain::new(self.ctx));
        chain.next_flow(self.ctx)
    }

    fn frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Target id of a host object as a literal, or an unresolved placeholder plus a diagnostic.
    fn object_literal(&mut self, object: ObjectRef) -> ValueOutRef {
        match self.ctx.resolve_object(&object) {
            Some(id) => self.ctx.create_literal(Literal::Int(id as i32)),
            None => {
                self.ctx
                    .diagnostics_mut()
                    .unresolved(format!("no target id for {:?}", object));
                self.ctx.create_unresolved_literal()
            }
        }
    }

    /// Joins several open flows into one through a pass-through sequence.
    fn join(&mut self, flows: &[FlowOutRef]) -> FlowOutRef {
        let sequence = self.ctx.create_node(Op::FlowSequence);
        for flow in flows {
            flow.connect_to_flow_destination(self.ctx, &sequence.flow_in("in"));
        }
        sequence.flow_out("0")
    }
}

/// Plain names a block assigns to: assignment targets and `++`/`--` operands.
fn assigned_names(stmts: &[Statement]) -> AHashSet<&str> {
    let mut names = AHashSet::new();
    for stmt in stmts {
        collect_statement_targets(stmt, &mut names);
    }
    names
}

fn collect_statement_targets<'s>(stmt: &'s Statement, names: &mut AHashSet<&'s str>) {
    for expr in &stmt.expressions {
        collect_targets(expr, names);
    }
    for child in &stmt.children {
        collect_statement_targets(child, names);
    }
}

fn collect_targets<'s>(expr: &'s Expression, names: &mut AHashSet<&'s str>) {
    if matches!(
        expr.kind,
        ExpressionKind::Assignment | ExpressionKind::PostfixUnary | ExpressionKind::PrefixUnary
    ) && matches!(expr.operator(), "++" | "--" | "" | "=" | "+=" | "-=" | "*=" | "/=" | "%=")
    {
        let target = expr.child(0).map(Expression::unwrapped);
        if let Some(name) = target
            .filter(|t| t.kind == ExpressionKind::Identifier)
            .and_then(|t| t.name.as_deref())
        {
            names.insert(name);
        }
    }
    for child in &expr.children {
        collect_targets(child, names);
    }
}

/// Evaluates a constant expression (literals, negated literals, all-constant constructors).
pub fn constant(expr: &Expression, expected: Option<ValueType>) -> Option<Literal> {
    let expr = expr.unwrapped();
    let ty = expected.or_else(|| expr.result_type.as_ref().and_then(value_type_of));
    match expr.kind {
        ExpressionKind::Literal => literal_value(expr.literal.as_ref()?, ty).ok(),
        ExpressionKind::Unary | ExpressionKind::PrefixUnary if expr.operator() == "-" => {
            let operand = expr.child(0)?.unwrapped();
            // Negate before narrowing so `-2147483648` stays representable.
            if let (ExpressionKind::Literal, Some(LiteralValue::Int(i))) = (&operand.kind, &operand.literal) {
                return literal_value(&LiteralValue::Int(i.checked_neg()?), ty).ok();
            }
            match constant(operand, ty)? {
                Literal::Int(i) => i.checked_neg().map(Literal::Int),
                Literal::Float(f) => Some(Literal::Float(-f)),
                _ => None,
            }
        }
        ExpressionKind::ObjectCreation => {
            let ty = expr.result_type.as_ref().and_then(value_type_of).or(ty)?;
            let components = expr
                .children
                .iter()
                .map(|c| constant(c, Some(ValueType::Float)).and_then(|l| l.as_float()))
                .collect::<Option<Vec<f32>>>()?;
            if components.is_empty() {
                return Some(ty.default_literal());
            }
            Literal::from_components(ty, &components)
        }
        _ => None,
    }
}

/// Converts a reflected literal, honoring the expected numeric type.
///
/// Integers outside the `i32` range are rejected rather than wrapped, and a float
/// narrowed to an integer must also land inside that range once truncated.
pub fn literal_value(value: &LiteralValue, expected: Option<ValueType>) -> Result<Literal, LiteralError> {
    match (value, expected) {
        (LiteralValue::Bool(b), _) => Ok(Literal::Bool(*b)),
        (LiteralValue::Int(i), Some(ValueType::Float)) => Ok(Literal::Float(*i as f32)),
        (LiteralValue::Int(i), _) => i32::try_from(*i).map(Literal::Int).map_err(|_| LiteralError::OutOfRange {
            value: i.to_string(),
            target: "int",
        }),
        (LiteralValue::Float(f), Some(ValueType::Int)) => {
            let truncated = f.trunc();
            if truncated >= f64::from(i32::MIN) && truncated <= f64::from(i32::MAX) {
                Ok(Literal::Int(truncated as i32))
            } else {
                Err(LiteralError::OutOfRange {
                    value: f.to_string(),
                    target: "int",
                })
            }
        }
        (LiteralValue::Float(f), _) => Ok(Literal::Float(*f as f32)),
        (LiteralValue::Text(_), _) => Err(LiteralError::Text),
    }
}
