use super::{
    BuiltinProperty, Expression, ExpressionKind, Walker, builtins, literal_value, value_type_of,
};
use crate::builders::math::{binary, combine, extract, unary};
use crate::builders::transform::{self, PropertyGet};
use crate::builders::variables::get_variable;
use crate::error::LiteralError;
use crate::export::{ExportContext, ObjectRef};
use crate::graph::{FlowOutRef, Literal, Op, ValueOutRef, ValueType};

/// Node kind of a binary operator. `!=` is handled separately as `eq` followed by `not`.
fn binary_op(operator: &str) -> Option<Op> {
    let op = match operator {
        "+" => Op::MathAdd,
        "-" => Op::MathSub,
        "*" => Op::MathMul,
        "/" => Op::MathDiv,
        "%" => Op::MathRem,
        "<" => Op::MathLt,
        "<=" => Op::MathLe,
        ">" => Op::MathGt,
        ">=" => Op::MathGe,
        "==" => Op::MathEq,
        "&&" => Op::MathAnd,
        "||" => Op::MathOr,
        _ => return None,
    };
    Some(op)
}

impl<'a> Walker<'a> {
    /// Graph value type of an expression's reflected result type. Object references are
    /// integer target ids.
    pub(super) fn expression_type(&self, expr: &Expression) -> Option<ValueType> {
        let ty = expr.result_type.as_ref()?;
        value_type_of(ty).or_else(|| builtins::is_object_type(ty).then_some(ValueType::Int))
    }

    /// Lowers a value expression. Returns `None`, after recording a diagnostic, for shapes
    /// that have no lowering.
    pub fn lower_expression(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let expr = expr.unwrapped();
        match expr.kind {
            ExpressionKind::Literal => {
                let Some(value) = expr.literal.as_ref() else {
                    self.ctx.diagnostics_mut().malformed("literal without value");
                    return None;
                };
                match literal_value(value, self.expression_type(expr)) {
                    Ok(literal) => Some(self.ctx.create_literal(literal)),
                    Err(LiteralError::Text) => {
                        self.ctx
                            .diagnostics_mut()
                            .unsupported("text literal outside a log message");
                        None
                    }
                    Err(err) => {
                        self.ctx.diagnostics_mut().malformed(err.to_string());
                        None
                    }
                }
            }
            ExpressionKind::Identifier => self.lower_identifier(expr),
            ExpressionKind::This => Some(self.object_literal(ObjectRef::This)),
            ExpressionKind::MemberAccess => self.lower_member_access(expr),
            ExpressionKind::MethodInvocation => self.process_method_invocation(expr, None).value,
            ExpressionKind::Binary => self.lower_binary(expr),
            ExpressionKind::Unary | ExpressionKind::PrefixUnary => self.lower_unary(expr),
            ExpressionKind::ObjectCreation => self.lower_object_creation(expr),
            ExpressionKind::ElementAccess => self.lower_element_access(expr),
            ExpressionKind::Cast => self.lower_cast(expr),
            ExpressionKind::Await => {
                let inner = expr.child(0)?;
                self.lower_expression(inner)
            }
            other => {
                self.ctx
                    .diagnostics_mut()
                    .unsupported(format!("{:?} used as a value", other));
                None
            }
        }
    }

    /// Lowers the right-hand side of a write. Calls with flow effects (delays, inlined
    /// same-unit calls) are sequenced after `flow` and the continuation is returned with the
    /// value; everything else leaves `flow` untouched.
    pub(super) fn lower_value_with_flow(
        &mut self,
        expr: &'a Expression,
        flow: FlowOutRef,
    ) -> (Option<ValueOutRef>, FlowOutRef) {
        let mut call = expr.unwrapped();
        if call.kind == ExpressionKind::Await {
            match call.child(0) {
                Some(inner) => call = inner.unwrapped(),
                None => return (None, flow),
            }
        }
        if call.kind == ExpressionKind::MethodInvocation && self.needs_flow(call) {
            let invocation = self.process_method_invocation(call, Some(flow.clone()));
            return (invocation.value, invocation.flow.unwrap_or(flow));
        }
        (self.lower_expression(expr), flow)
    }

    fn lower_identifier(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let name = expr.name.as_deref().unwrap_or_default();
        if let Some(frame) = self.frame() {
            if let Some(bound) = frame.bindings.get(name) {
                return Some(bound.clone());
            }
            if let Some(&id) = frame.locals.get(name) {
                return Some(get_variable(self.ctx, id));
            }
        }
        if let Some(&id) = self.fields.get(name) {
            return Some(get_variable(self.ctx, id));
        }
        let class = self.class;
        if let Some(field) = class.field(name) {
            if builtins::is_object_type(&field.field_type) {
                return Some(self.object_literal(ObjectRef::Field(name.to_string())));
            }
        }
        self.ctx
            .diagnostics_mut()
            .unresolved(format!("unknown name '{}'", name));
        None
    }

    /// Target id of the object a member access or call is applied to. A missing receiver is
    /// the compiled object itself.
    pub(super) fn lower_object(&mut self, receiver: Option<&'a Expression>) -> ValueOutRef {
        let Some(receiver) = receiver.map(Expression::unwrapped) else {
            return self.object_literal(ObjectRef::This);
        };
        match receiver.kind {
            ExpressionKind::This => self.object_literal(ObjectRef::This),
            ExpressionKind::MemberAccess => {
                let member = receiver.member.as_ref();
                match member.and_then(BuiltinProperty::recognize) {
                    Some(BuiltinProperty::Transform | BuiltinProperty::GameObject) => {
                        self.lower_object(receiver.child(0))
                    }
                    _ => self
                        .lower_expression(receiver)
                        .unwrap_or_else(|| self.ctx.create_unresolved_literal()),
                }
            }
            _ => self
                .lower_expression(receiver)
                .unwrap_or_else(|| self.ctx.create_unresolved_literal()),
        }
    }

    /// Name of the list field an expression refers to, if it is one.
    pub(super) fn list_name(&self, expr: &Expression) -> Option<String> {
        let expr = expr.unwrapped();
        let name = match expr.kind {
            ExpressionKind::Identifier => expr.name.clone()?,
            ExpressionKind::MemberAccess
                if expr
                    .child(0)
                    .is_none_or(|r| r.unwrapped().kind == ExpressionKind::This) =>
            {
                expr.member.as_ref()?.name.clone()
            }
            _ => return None,
        };
        self.lists.contains_key(&name).then_some(name)
    }

    fn lower_member_access(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let Some(member) = expr.member.as_ref() else {
            self.ctx.diagnostics_mut().malformed("member access without member");
            return None;
        };
        let receiver = expr.child(0);
        let on_self = receiver.is_none_or(|r| r.unwrapped().kind == ExpressionKind::This);
        if on_self {
            if let Some(&id) = self.fields.get(&member.name) {
                return Some(get_variable(self.ctx, id));
            }
        }

        let Some(property) = BuiltinProperty::recognize(member) else {
            self.ctx.diagnostics_mut().unresolved(format!(
                "unknown member '{}.{}'",
                member.declaring_type.name, member.name
            ));
            return None;
        };
        match property {
            BuiltinProperty::Position => Some(self.read_property(receiver, transform::world_position_get)),
            BuiltinProperty::LocalPosition => Some(self.read_property(receiver, transform::local_position_get)),
            BuiltinProperty::Rotation => Some(self.read_property(receiver, transform::world_rotation_get)),
            BuiltinProperty::LocalRotation => Some(self.read_property(receiver, transform::local_rotation_get)),
            BuiltinProperty::LocalScale => Some(self.read_property(receiver, transform::local_scale_get)),
            BuiltinProperty::LossyScale => Some(self.read_property(receiver, transform::world_scale_get)),
            BuiltinProperty::Component(index) => {
                let receiver = receiver?;
                let count = self
                    .expression_type(receiver)
                    .map(|t| t.component_count())
                    .unwrap_or(member_component_count(&member.declaring_type.name));
                let vector = self.lower_expression(receiver)?;
                let parts = extract(self.ctx, &vector, count);
                match parts.and_then(|p| p.into_iter().nth(index)) {
                    Some(part) => Some(part),
                    None => {
                        self.ctx.diagnostics_mut().unsupported(format!(
                            "component {} of a {}-component value",
                            member.name, count
                        ));
                        None
                    }
                }
            }
            BuiltinProperty::Normalized => {
                let vector = self.lower_expression(receiver?)?;
                Some(unary(self.ctx, Op::MathNormalize, &vector))
            }
            BuiltinProperty::Magnitude => {
                let vector = self.lower_expression(receiver?)?;
                Some(unary(self.ctx, Op::MathLength, &vector))
            }
            BuiltinProperty::ListCount => {
                let list = match receiver.and_then(|r| self.list_name(r)) {
                    Some(name) => self.lists.get_mut(&name),
                    None => None,
                };
                let Some(list) = list else {
                    self.ctx
                        .diagnostics_mut()
                        .unsupported("Count of something other than a list field");
                    return None;
                };
                Some(list.count_value(self.ctx))
            }
            BuiltinProperty::DeltaTime => {
                let tick = self.tick_node();
                Some(tick.value_out("timeSinceLastTick"))
            }
            BuiltinProperty::Time => {
                let tick = self.tick_node();
                Some(tick.value_out("timeSinceStart"))
            }
            BuiltinProperty::Transform | BuiltinProperty::GameObject => {
                Some(self.lower_object(receiver))
            }
        }
    }

    fn read_property(
        &mut self,
        receiver: Option<&'a Expression>,
        build: fn(&mut ExportContext) -> PropertyGet,
    ) -> ValueOutRef {
        let object = self.lower_object(receiver);
        let property = build(self.ctx);
        property.target.connect_to_source(self.ctx, &object);
        property.value
    }

    fn lower_binary(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let (Some(lhs), Some(rhs)) = (expr.child(0), expr.child(1)) else {
            self.ctx.diagnostics_mut().malformed("binary expression without both operands");
            return None;
        };
        let operator = expr.operator();
        let (negate, op) = match operator {
            "!=" => (true, Op::MathEq),
            other => match binary_op(other) {
                Some(op) => (false, op),
                None => {
                    self.ctx
                        .diagnostics_mut()
                        .unsupported(format!("binary operator '{}'", other));
                    return None;
                }
            },
        };
        let a = self.lower_expression(lhs)?;
        let b = self.lower_expression(rhs)?;
        let (lt, rt) = (self.expression_type(lhs), self.expression_type(rhs));
        let a = self.coerce_operand(&a, lhs, rt);
        let b = self.coerce_operand(&b, rhs, lt);
        let value = binary(self.ctx, op, &a, &b);
        if negate {
            return Some(unary(self.ctx, Op::MathNot, &value));
        }
        Some(value)
    }

    /// Brings `value` to the shape of the other operand: ints widen to floats and floats
    /// broadcast across vectors. Anything else passes through.
    pub(super) fn coerce_operand(
        &mut self,
        value: &ValueOutRef,
        expr: &Expression,
        other: Option<ValueType>,
    ) -> ValueOutRef {
        let (Some(own), Some(other)) = (self.expression_type(expr), other) else {
            return value.clone();
        };
        let value = if own == ValueType::Int && other != ValueType::Int && other != ValueType::Bool {
            unary(self.ctx, Op::TypeIntToFloat, value)
        } else {
            value.clone()
        };
        let widened = if own == ValueType::Int { ValueType::Float } else { own };
        if widened == ValueType::Float && matches!(other, ValueType::Float2 | ValueType::Float3 | ValueType::Float4) {
            let parts = vec![value; other.component_count()];
            return combine(self.ctx, &parts).unwrap_or_else(|| parts[0].clone());
        }
        value
    }

    fn lower_unary(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let operand = expr.child(0)?;
        match expr.operator() {
            "-" => {
                if let Some(literal) = super::constant(expr, self.expression_type(expr)) {
                    return Some(self.ctx.create_literal(literal));
                }
                let value = self.lower_expression(operand)?;
                Some(unary(self.ctx, Op::MathNeg, &value))
            }
            "!" => {
                let value = self.lower_expression(operand)?;
                Some(unary(self.ctx, Op::MathNot, &value))
            }
            "+" => self.lower_expression(operand),
            other => {
                self.ctx
                    .diagnostics_mut()
                    .unsupported(format!("unary operator '{}' in a value", other));
                None
            }
        }
    }

    /// `new Vector3(x, y, z)` and friends. All-constant arguments fold into one literal.
    fn lower_object_creation(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let Some(ty) = self.expression_type(expr) else {
            self.ctx.diagnostics_mut().unsupported(format!(
                "construction of '{}'",
                expr.type_name().unwrap_or("?")
            ));
            return None;
        };
        if let Some(literal) = super::constant(expr, Some(ty)) {
            return Some(self.ctx.create_literal(literal));
        }
        let count = ty.component_count();
        let mut parts = Vec::with_capacity(count);
        for arg in &expr.children {
            let value = self.lower_expression(arg)?;
            parts.push(self.coerce_operand(&value, arg, Some(ValueType::Float)));
        }
        // Missing trailing components default to zero, as in `new Vector3(x, y)`.
        while parts.len() < count {
            parts.push(self.ctx.create_literal(Literal::Float(0.0)));
        }
        match combine(self.ctx, &parts) {
            Some(value) => Some(value),
            None => {
                self.ctx.diagnostics_mut().unsupported(format!(
                    "construction of {} from {} components",
                    ty,
                    parts.len()
                ));
                None
            }
        }
    }

    fn lower_element_access(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let (Some(collection), Some(index)) = (expr.child(0), expr.child(1)) else {
            self.ctx
                .diagnostics_mut()
                .malformed("element access without collection and index");
            return None;
        };
        let Some(name) = self.list_name(collection) else {
            self.ctx
                .diagnostics_mut()
                .unsupported("indexing something other than a list field");
            return None;
        };
        let index = self.lower_expression(index)?;
        let list = self.lists.get_mut(&name)?;
        Some(list.get_item_checked(self.ctx, &index))
    }

    fn lower_cast(&mut self, expr: &'a Expression) -> Option<ValueOutRef> {
        let operand = expr.child(0)?;
        let value = self.lower_expression(operand)?;
        match (self.expression_type(operand), self.expression_type(expr)) {
            (Some(ValueType::Float), Some(ValueType::Int)) => {
                Some(unary(self.ctx, Op::TypeFloatToInt, &value))
            }
            (Some(ValueType::Int), Some(ValueType::Float)) => {
                Some(unary(self.ctx, Op::TypeIntToFloat, &value))
            }
            _ => Some(value),
        }
    }
}

fn member_component_count(declaring: &str) -> usize {
    match declaring {
        "Vector2" => 2,
        "Vector3" => 3,
        _ => 4,
    }
}
