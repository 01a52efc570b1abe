use super::{
    Builtin, Expression, ExpressionKind, Frame, LiteralValue, LogSeverity, MethodInfo,
    StatementKind, Walker,
};
use crate::builders::flow::delay_milliseconds;
use crate::builders::math::{binary, unary};
use crate::builders::{quaternion, transform};
use crate::graph::{ConfigValue, FlowInRef, FlowOutRef, Op, ValueInRef, ValueOutRef, ValueType};

/// Result of lowering a call.
///
/// `value` is the call's result, if it has one. `flow` is the continuation when the call was
/// lowered in statement mode; it equals the supplied flow for calls without flow effects.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub value: Option<ValueOutRef>,
    pub flow: Option<FlowOutRef>,
}

impl Invocation {
    fn passthrough(flow: Option<FlowOutRef>) -> Self {
        Self { value: None, flow }
    }

    fn value(value: Option<ValueOutRef>, flow: Option<FlowOutRef>) -> Self {
        Self { value, flow }
    }
}

/// One piece of a log message: fixed text or a value slot.
enum MessagePart<'e> {
    Text(String),
    Value(&'e Expression),
}

impl<'a> Walker<'a> {
    /// Lowers a method invocation.
    ///
    /// With `flow` set (statement mode) the call is sequenced after it and the continuation is
    /// returned. Without it (expression mode) only value-producing lowerings apply; calls that
    /// need flow are reported and yield no value.
    pub fn process_method_invocation(
        &mut self,
        expr: &'a Expression,
        flow: Option<FlowOutRef>,
    ) -> Invocation {
        let Some(method) = expr.method.as_ref() else {
            self.ctx
                .diagnostics_mut()
                .malformed("invocation without method symbol");
            return Invocation::passthrough(flow);
        };
        if let Some(builtin) = Builtin::recognize(method) {
            if builtin.has_flow_effect() && flow.is_none() {
                self.ctx.diagnostics_mut().unsupported(format!(
                    "{}.{} used as a value",
                    method.declaring_type.name, method.name
                ));
                return Invocation::default();
            }
            return self.lower_builtin(builtin, expr, flow);
        }
        if let Some(callee) = self.same_unit_callee(expr) {
            let args = expr.children.get(1..).unwrap_or_default();
            return self.inline_call(callee, args, flow);
        }
        self.ctx.diagnostics_mut().unresolved(format!(
            "call to unknown method {}.{}",
            method.declaring_type.name, method.name
        ));
        Invocation::passthrough(flow)
    }

    /// Whether lowering `call` creates flow nodes that must be sequenced.
    pub(super) fn needs_flow(&self, call: &Expression) -> bool {
        match call.method.as_ref().and_then(Builtin::recognize) {
            Some(builtin) => builtin.has_flow_effect(),
            None => self
                .same_unit_callee(call)
                .is_some_and(|callee| single_return(callee).is_none()),
        }
    }

    fn same_unit_callee(&self, call: &Expression) -> Option<&'a MethodInfo> {
        let method = call.method.as_ref()?;
        let receiver_is_self = call
            .child(0)
            .is_none_or(|r| r.unwrapped().kind == ExpressionKind::This);
        let declared_here = method.declaring_type.name == self.class.name;
        if !receiver_is_self && !declared_here {
            return None;
        }
        let class = self.class;
        class.method(&method.name)
    }

    fn arguments(&mut self, expr: &'a Expression) -> Option<Vec<ValueOutRef>> {
        expr.children
            .iter()
            .skip(1)
            .map(|arg| self.lower_expression(arg))
            .collect()
    }

    fn lower_builtin(
        &mut self,
        builtin: Builtin,
        expr: &'a Expression,
        flow: Option<FlowOutRef>,
    ) -> Invocation {
        let receiver = expr.child(0);
        let args = expr.children.get(1..).unwrap_or_default();
        match builtin {
            Builtin::Math(op) => {
                let Some(values) = self.arguments(expr) else {
                    return Invocation::passthrough(flow);
                };
                let sockets = op.schema().values_in;
                if values.len() != sockets.len() {
                    self.ctx.diagnostics_mut().malformed(format!(
                        "{} takes {} argument(s), got {}",
                        op,
                        sockets.len(),
                        values.len()
                    ));
                    return Invocation::passthrough(flow);
                }
                let result = self.expression_type(expr);
                let node = self.ctx.create_node(op);
                for (socket, (value, arg)) in sockets.iter().zip(values.iter().zip(args.iter())) {
                    let value = self.coerce_operand(value, arg, result);
                    node.value_in(socket).connect_to_source(self.ctx, &value);
                }
                Invocation::value(Some(node.value_out("value")), flow)
            }
            Builtin::Distance => {
                let Some(values) = self.arguments(expr) else {
                    return Invocation::passthrough(flow);
                };
                let [a, b] = values.as_slice() else {
                    self.ctx.diagnostics_mut().malformed("Distance takes two arguments");
                    return Invocation::passthrough(flow);
                };
                let offset = binary(self.ctx, Op::MathSub, a, b);
                let length = unary(self.ctx, Op::MathLength, &offset);
                Invocation::value(Some(length), flow)
            }
            Builtin::QuaternionEuler => {
                let euler = self.vector_argument(expr, 3);
                let value = euler.map(|e| quaternion::from_euler_degrees(self.ctx, &e));
                Invocation::value(value, flow)
            }
            Builtin::QuaternionInverse => {
                let value = args
                    .first()
                    .and_then(|arg| self.lower_expression(arg))
                    .map(|q| quaternion::invert(self.ctx, &q));
                Invocation::value(value, flow)
            }
            _ => match flow {
                Some(flow) => self.lower_flow_builtin(builtin, expr, receiver, flow),
                None => Invocation::default(),
            },
        }
    }

    /// A vector argument given either as one vector or as `count` scalars.
    fn vector_argument(&mut self, expr: &'a Expression, count: usize) -> Option<ValueOutRef> {
        let values = self.arguments(expr)?;
        match values.len() {
            1 => values.into_iter().next(),
            n if n == count => {
                let args = expr.children.get(1..).unwrap_or_default();
                let parts: Vec<_> = values
                    .iter()
                    .zip(args)
                    .map(|(v, arg)| self.coerce_operand(v, arg, Some(ValueType::Float)))
                    .collect();
                crate::builders::math::combine(self.ctx, &parts)
            }
            n => {
                self.ctx
                    .diagnostics_mut()
                    .malformed(format!("expected 1 or {} arguments, got {}", count, n));
                None
            }
        }
    }

    /// Builtins that run as a step in the flow. Returns the continuation after the step.
    fn lower_flow_builtin(
        &mut self,
        builtin: Builtin,
        expr: &'a Expression,
        receiver: Option<&'a Expression>,
        flow: FlowOutRef,
    ) -> Invocation {
        let args = expr.children.get(1..).unwrap_or_default();
        let step: Option<(FlowInRef, FlowOutRef)> = match builtin {
            Builtin::Delay => {
                let Some(arg) = args.first() else {
                    self.ctx.diagnostics_mut().malformed("Delay without duration");
                    return Invocation::passthrough(Some(flow));
                };
                let integral = self.expression_type(arg) != Some(ValueType::Float);
                let Some(duration) = self.lower_expression(arg) else {
                    return Invocation::passthrough(Some(flow));
                };
                let delay = delay_milliseconds(self.ctx, integral);
                delay.duration.connect_to_source(self.ctx, &duration);
                Some((delay.flow_in, delay.done))
            }
            Builtin::SetActive => {
                let value = args.first().and_then(|arg| self.lower_expression(arg));
                value.map(|value| {
                    let object = self.lower_object(receiver);
                    let set = transform::active_set(self.ctx);
                    set.target.connect_to_source(self.ctx, &object);
                    set.value.connect_to_source(self.ctx, &value);
                    (set.flow_in, set.flow_out)
                })
            }
            Builtin::Log(severity) => Some(self.lower_log(severity, args)),
            Builtin::Translate => self.vector_argument(expr, 3).map(|offset| {
                let object = self.lower_object(receiver);
                let action = transform::translate(self.ctx, &offset);
                action.target.connect_to_source(self.ctx, &object);
                (action.flow_in, action.flow_out)
            }),
            Builtin::Rotate => self.vector_argument(expr, 3).map(|euler| {
                let object = self.lower_object(receiver);
                let rotation = quaternion::from_euler_degrees(self.ctx, &euler);
                let action = transform::rotate(self.ctx, &rotation);
                action.target.connect_to_source(self.ctx, &object);
                (action.flow_in, action.flow_out)
            }),
            Builtin::LookAt => {
                let point = args.first().and_then(|arg| self.look_target(arg));
                point.map(|point| {
                    let object = self.lower_object(receiver);
                    let action = transform::look_at(self.ctx, &point);
                    action.target.connect_to_source(self.ctx, &object);
                    (action.flow_in, action.flow_out)
                })
            }
            Builtin::SetPositionAndRotation => {
                let position = args.first().and_then(|arg| self.lower_expression(arg));
                let rotation = args.get(1).and_then(|arg| self.lower_expression(arg));
                match (position, rotation) {
                    (Some(position), Some(rotation)) => {
                        let object = self.lower_object(receiver);
                        let move_to = transform::world_position_set(self.ctx);
                        let turn_to = transform::world_rotation_set(self.ctx);
                        ValueInRef::link([move_to.target, turn_to.target])
                            .connect_to_source(self.ctx, &object);
                        move_to.value.connect_to_source(self.ctx, &position);
                        turn_to.value.connect_to_source(self.ctx, &rotation);
                        move_to
                            .flow_out
                            .connect_to_flow_destination(self.ctx, &turn_to.flow_in);
                        Some((move_to.flow_in, turn_to.flow_out))
                    }
                    _ => None,
                }
            }
            Builtin::ListAdd | Builtin::ListInsert | Builtin::ListRemoveAt | Builtin::ListClear => {
                self.lower_list_call(builtin, receiver, args)
            }
            Builtin::Math(_)
            | Builtin::Distance
            | Builtin::QuaternionEuler
            | Builtin::QuaternionInverse => None,
        };

        match step {
            Some((step_in, step_out)) => {
                flow.connect_to_flow_destination(self.ctx, &step_in);
                Invocation::passthrough(Some(step_out))
            }
            None => Invocation::passthrough(Some(flow)),
        }
    }

    /// `LookAt` accepts a transform (its world position) or a point.
    fn look_target(&mut self, arg: &'a Expression) -> Option<ValueOutRef> {
        let is_object = arg
            .result_type
            .as_ref()
            .is_some_and(super::builtins::is_object_type);
        if !is_object {
            return self.lower_expression(arg);
        }
        let object = self.lower_object(Some(arg));
        let position = transform::world_position_get(self.ctx);
        position.target.connect_to_source(self.ctx, &object);
        Some(position.value)
    }

    fn lower_list_call(
        &mut self,
        builtin: Builtin,
        receiver: Option<&'a Expression>,
        args: &'a [Expression],
    ) -> Option<(FlowInRef, FlowOutRef)> {
        let Some(name) = receiver.and_then(|r| self.list_name(r)) else {
            self.ctx
                .diagnostics_mut()
                .unsupported("list call on something other than a list field");
            return None;
        };
        let values = args
            .iter()
            .map(|arg| self.lower_expression(arg))
            .collect::<Option<Vec<_>>>()?;
        let list = self.lists.get_mut(&name)?;
        match (builtin, values.as_slice()) {
            (Builtin::ListAdd, [value]) => {
                let add = list.add_item_flow(self.ctx);
                add.value.connect_to_source(self.ctx, value);
                Some((add.flow_in, add.flow_out))
            }
            (Builtin::ListInsert, [index, value]) => {
                let insert = list.insert_item_flow(self.ctx);
                insert.index.connect_to_source(self.ctx, index);
                insert.value.connect_to_source(self.ctx, value);
                Some((insert.flow_in, insert.flow_out))
            }
            (Builtin::ListRemoveAt, [index]) => {
                let remove = list.remove_item_flow(self.ctx);
                remove.index.connect_to_source(self.ctx, index);
                Some((remove.flow_in, remove.flow_out))
            }
            (Builtin::ListClear, []) => Some(list.clear_flow(self.ctx)),
            (builtin, values) => {
                self.ctx.diagnostics_mut().malformed(format!(
                    "{:?} with {} argument(s)",
                    builtin,
                    values.len()
                ));
                None
            }
        }
    }

    /// Builds a `debug/log` node. Text pieces of string concatenations become the message
    /// template and every other operand becomes a `{n}` slot.
    fn lower_log(&mut self, severity: LogSeverity, args: &'a [Expression]) -> (FlowInRef, FlowOutRef) {
        let mut parts = Vec::new();
        for arg in args {
            flatten_message(arg, &mut parts);
        }

        let node = self.ctx.create_node(Op::DebugLog);
        let mut template = String::new();
        let mut slot = 0;
        for part in parts {
            match part {
                // Templates have no escape for braces, so literal ones are dropped.
                MessagePart::Text(text) => template.extend(text.chars().filter(|c| !matches!(c, '{' | '}'))),
                MessagePart::Value(expr) => {
                    let name = slot.to_string();
                    template.push_str(&format!("{{{}}}", name));
                    slot += 1;
                    // A slot left unconnected is reported by validation.
                    if let Some(value) = self.lower_expression(expr) {
                        node.value_in(&name).connect_to_source(self.ctx, &value);
                    }
                }
            }
        }
        node.set_config(self.ctx, "severity", ConfigValue::Int(severity as i32));
        node.set_config(self.ctx, "message", ConfigValue::Text(template));
        (node.flow_in("in"), node.flow_out("out"))
    }

    /// Inlines a call to a method of the class being compiled.
    ///
    /// Statement mode wraps the callee body in a `flow/sequence`: port 0 runs the body and
    /// port 1 feeds a `flow/waitAll` that also waits for every body tail, so the
    /// continuation fires once the body has finished, even across delays. Expression mode
    /// only inlines bodies that are a single `return expr;`.
    fn inline_call(
        &mut self,
        callee: &'a MethodInfo,
        args: &'a [Expression],
        flow: Option<FlowOutRef>,
    ) -> Invocation {
        let depth_limit = self.ctx.options().max_inline_depth;
        if self.inline_stack.iter().any(|m| m == &callee.name) || self.inline_stack.len() >= depth_limit {
            self.ctx.diagnostics_mut().unsupported(format!(
                "call to '{}' not inlined: recursion or depth limit {} reached",
                callee.name, depth_limit
            ));
            return Invocation::passthrough(flow);
        }

        let mut frame = Frame {
            method: callee.name.clone(),
            ..Frame::default()
        };
        for (parameter, arg) in callee.parameters.iter().zip(args) {
            if let Some(value) = self.lower_expression(arg) {
                frame.bindings.insert(parameter.name.clone(), value);
            }
        }
        let return_type = callee
            .return_type
            .as_ref()
            .and_then(|t| self.parameter_type(t));

        let Some(flow) = flow else {
            let Some(body) = single_return(callee) else {
                self.ctx.diagnostics_mut().unsupported(format!(
                    "'{}' has statements and cannot be inlined into an expression",
                    callee.name
                ));
                return Invocation::default();
            };
            let value = self.with_frame(callee, frame, |walker| walker.lower_expression(body));
            return Invocation::value(value, None);
        };

        frame.return_variable = return_type.map(|ty| {
            let name = format!("{}_return", callee.name);
            self.ctx
                .add_variable_with_id_if_needed(&name, Some(ty.default_literal()), ty)
        });
        let return_variable = frame.return_variable;

        let sequence = self.ctx.create_node(Op::FlowSequence);
        flow.connect_to_flow_destination(self.ctx, &sequence.flow_in("in"));
        let body_flow = sequence.flow_out("0");
        let exits = self.with_frame(callee, frame, |walker| {
            let entry = walker.copy_parameters(callee, true, body_flow);
            walker.walk_block(&callee.body, entry)
        });
        let tails = exits.tails();

        let continuation = if tails.is_empty() {
            sequence.flow_out("1")
        } else {
            let join = self.ctx.create_node(Op::FlowWaitAll);
            join.set_config(self.ctx, "inputFlows", ConfigValue::Int(2));
            for tail in &tails {
                tail.connect_to_flow_destination(self.ctx, &join.flow_in("0"));
            }
            sequence
                .flow_out("1")
                .connect_to_flow_destination(self.ctx, &join.flow_in("1"));
            join.flow_out("out")
        };

        let value = return_variable.map(|id| crate::builders::variables::get_variable(self.ctx, id));
        Invocation::value(value, Some(continuation))
    }

    fn with_frame<T>(
        &mut self,
        callee: &MethodInfo,
        frame: Frame,
        body: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let caller = self.ctx.diagnostics().method().to_string();
        self.ctx.diagnostics_mut().set_method(&callee.name);
        self.inline_stack.push(callee.name.clone());
        self.frames.push(frame);
        tracing::debug!(callee = %callee.name, depth = self.inline_stack.len(), "inlining call");

        let result = body(self);

        self.frames.pop();
        self.inline_stack.pop();
        self.ctx.diagnostics_mut().set_method(&caller);
        result
    }
}

/// The expression of a body that is exactly `return expr;`.
fn single_return(method: &MethodInfo) -> Option<&Expression> {
    match method.body.as_slice() {
        [stmt] if stmt.kind == StatementKind::Return => stmt.expression(),
        _ => None,
    }
}

fn flatten_message<'e>(expr: &'e Expression, parts: &mut Vec<MessagePart<'e>>) {
    let expr = expr.unwrapped();
    let is_text = expr.type_name().is_some_and(|name| name == "String" || name == "string");
    match expr.kind {
        ExpressionKind::Literal => match &expr.literal {
            Some(LiteralValue::Text(text)) => parts.push(MessagePart::Text(text.clone())),
            _ => parts.push(MessagePart::Value(expr)),
        },
        ExpressionKind::Binary if expr.operator() == "+" && is_text => {
            for child in &expr.children {
                flatten_message(child, parts);
            }
        }
        _ => parts.push(MessagePart::Value(expr)),
    }
}
