use super::{BuiltinProperty, Exits, Expression, ExpressionKind, Statement, StatementKind, Walker};
use crate::builders::flow::{wait_until, wait_while};
use crate::builders::math::{binary, binary_literal};
use crate::builders::transform::{self, PropertySet};
use crate::builders::variables::set_variable_from;
use crate::graph::{FlowOutRef, Literal, Op, ValueOutRef, ValueType, VariableId};

/// Operator of a compound assignment (`+=` and friends), if it is one.
fn compound_op(operator: &str) -> Option<Op> {
    let op = match operator {
        "+=" => Op::MathAdd,
        "-=" => Op::MathSub,
        "*=" => Op::MathMul,
        "/=" => Op::MathDiv,
        "%=" => Op::MathRem,
        _ => return None,
    };
    Some(op)
}

impl<'a> Walker<'a> {
    /// Lowers one statement starting at `in_flow`.
    ///
    /// Returns the flow to continue from, or `None` when control forks without rejoining
    /// (an `if` statement) or leaves the method.
    pub fn process_statement(&mut self, stmt: &'a Statement, in_flow: FlowOutRef) -> Option<FlowOutRef> {
        let mut exits = self.lower_statement(stmt, in_flow);
        if stmt.kind == StatementKind::If || exits.open.len() != 1 {
            return None;
        }
        exits.open.pop()
    }

    /// Lowers an `if` statement. Control never rejoins here, so this always returns `None`;
    /// the enclosing block decides whether the open arms continue together.
    pub fn process_if_statement(&mut self, stmt: &'a Statement, in_flow: FlowOutRef) -> Option<FlowOutRef> {
        self.lower_if(stmt, in_flow);
        None
    }

    pub(super) fn lower_statement(&mut self, stmt: &'a Statement, flow: FlowOutRef) -> Exits {
        match stmt.kind {
            StatementKind::Expression => self.lower_expression_statement(stmt, flow),
            StatementKind::Declaration => self.lower_declaration(stmt, flow),
            StatementKind::Assignment => match stmt.expression() {
                Some(expr) => Exits::open(self.lower_assignment(expr, flow)),
                None => {
                    self.ctx
                        .diagnostics_mut()
                        .malformed("assignment statement without expression");
                    Exits::open(flow)
                }
            },
            StatementKind::If => self.lower_if(stmt, flow),
            StatementKind::Return => self.lower_return(stmt, flow),
            StatementKind::Block => self.walk_block(&stmt.children, flow),
            StatementKind::For => self.lower_for(stmt, flow),
            other => {
                self.ctx
                    .diagnostics_mut()
                    .malformed(format!("structural {:?} record outside its parent", other));
                Exits::open(flow)
            }
        }
    }

    /// Walks statements in order, joining forked flows before each next statement.
    ///
    /// When a statement leaves several open flows (an `if` whose arms both fall through) they
    /// all enter one pass-through `flow/sequence`, and the next statement continues from it.
    /// Arms that returned are not joined. Statements after a point no flow reaches are
    /// skipped with a diagnostic.
    pub(super) fn walk_block(&mut self, stmts: &'a [Statement], flow: FlowOutRef) -> Exits {
        let mut open = vec![flow];
        let mut returned = Vec::new();
        for (i, stmt) in stmts.iter().enumerate() {
            let entry = if open.len() > 1 {
                self.join(&open)
            } else if let Some(single) = open.pop() {
                single
            } else {
                self.ctx.diagnostics_mut().unsupported(format!(
                    "{} unreachable statement(s) after every path returned",
                    stmts.len() - i
                ));
                break;
            };
            let exits = self.lower_statement(stmt, entry);
            open = exits.open;
            returned.extend(exits.returned);
        }
        Exits { open, returned }
    }

    fn lower_expression_statement(&mut self, stmt: &'a Statement, flow: FlowOutRef) -> Exits {
        let Some(expr) = stmt.expression() else {
            self.ctx
                .diagnostics_mut()
                .malformed("expression statement without expression");
            return Exits::open(flow);
        };
        let expr = expr.unwrapped();
        let flow = match expr.kind {
            ExpressionKind::MethodInvocation => self.invoke_statement(expr, flow),
            ExpressionKind::Await => match expr.child(0).map(Expression::unwrapped) {
                Some(inner) if inner.kind == ExpressionKind::MethodInvocation => {
                    self.invoke_statement(inner, flow)
                }
                Some(inner) if inner.kind == ExpressionKind::ObjectCreation => {
                    self.lower_wait(inner, flow)
                }
                _ => {
                    self.ctx
                        .diagnostics_mut()
                        .unsupported("await of something other than a call");
                    flow
                }
            },
            ExpressionKind::Assignment => self.lower_assignment(expr, flow),
            ExpressionKind::PostfixUnary | ExpressionKind::PrefixUnary => {
                self.lower_increment(expr, flow)
            }
            other => {
                self.ctx
                    .diagnostics_mut()
                    .unsupported(format!("{:?} used as a statement", other));
                flow
            }
        };
        Exits::open(flow)
    }

    /// `await new WaitUntil(cond)` and `await new WaitWhile(cond)`: a polling wait on the
    /// shared tick event.
    fn lower_wait(&mut self, expr: &'a Expression, flow: FlowOutRef) -> FlowOutRef {
        let until = match expr.type_name() {
            Some("WaitUntil") => true,
            Some("WaitWhile") => false,
            other => {
                self.ctx.diagnostics_mut().unsupported(format!(
                    "await of '{}'",
                    other.unwrap_or("<unknown>")
                ));
                return flow;
            }
        };
        let Some(condition) = expr.child(0).and_then(|c| self.lower_expression(c)) else {
            self.ctx
                .diagnostics_mut()
                .malformed("wait without a condition");
            return flow;
        };
        let wait = if until {
            wait_until(self.ctx, &mut self.tick)
        } else {
            wait_while(self.ctx, &mut self.tick)
        };
        wait.condition.connect_to_source(self.ctx, &condition);
        flow.connect_to_flow_destination(self.ctx, &wait.flow_in);
        wait.flow_out
    }

    fn invoke_statement(&mut self, expr: &'a Expression, flow: FlowOutRef) -> FlowOutRef {
        let invocation = self.process_method_invocation(expr, Some(flow.clone()));
        invocation.flow.unwrap_or(flow)
    }

    fn lower_declaration(&mut self, stmt: &'a Statement, mut flow: FlowOutRef) -> Exits {
        for declarator in stmt
            .children
            .iter()
            .filter(|c| c.kind == StatementKind::VariableDeclarator)
        {
            let Some(name_expr) = declarator.expression() else {
                self.ctx
                    .diagnostics_mut()
                    .malformed("variable declarator without a name");
                continue;
            };
            let Some(name) = name_expr.name.as_deref() else {
                self.ctx
                    .diagnostics_mut()
                    .malformed("variable declarator without a name");
                continue;
            };
            let initializer = declarator
                .child(StatementKind::Initializer)
                .and_then(Statement::expression);
            let ty = name_expr
                .result_type
                .as_ref()
                .or_else(|| initializer.and_then(|e| e.result_type.as_ref()))
                .and_then(|t| self.parameter_type(t));
            let Some(ty) = ty else {
                self.ctx
                    .diagnostics_mut()
                    .unsupported(format!("local '{}' has no supported type", name));
                continue;
            };
            let id = self.declare_local(name, ty);
            if let Some(init) = initializer {
                let (value, next) = self.lower_value_with_flow(init, flow);
                flow = next;
                if let Some(value) = value {
                    let set = set_variable_from(self.ctx, id, &value);
                    flow.connect_to_flow_destination(self.ctx, &set.flow_in);
                    flow = set.flow_out;
                }
            }
        }
        Exits::open(flow)
    }

    /// Declares a local of the current frame, backed by a variable named `{method}_{local}`.
    pub(super) fn declare_local(&mut self, name: &str, ty: ValueType) -> VariableId {
        let method = self.frame().map(|f| f.method.clone()).unwrap_or_default();
        let id = self.ctx.add_variable_with_id_if_needed(
            &format!("{}_{}", method, name),
            Some(ty.default_literal()),
            ty,
        );
        if let Some(frame) = self.frame_mut() {
            frame.bindings.remove(name);
            frame.locals.insert(name.to_string(), id);
        }
        id
    }

    /// The variable a plain name assigns to: a local or a field. Parameters the body writes
    /// were copied into locals on entry.
    pub(super) fn assignable_variable(&self, name: &str) -> Option<VariableId> {
        if let Some(id) = self.frame().and_then(|f| f.locals.get(name).copied()) {
            return Some(id);
        }
        self.fields.get(name).copied()
    }

    /// Lowers `target = value` and the compound forms, returning the continuation.
    pub(super) fn lower_assignment(&mut self, expr: &'a Expression, flow: FlowOutRef) -> FlowOutRef {
        let (Some(target), Some(rhs)) = (expr.child(0), expr.child(1)) else {
            self.ctx
                .diagnostics_mut()
                .malformed("assignment without both operands");
            return flow;
        };
        let target = target.unwrapped();
        let (value, flow) = self.lower_value_with_flow(rhs, flow);
        let Some(value) = value else {
            return flow;
        };
        let value = match compound_op(expr.operator()) {
            Some(op) => {
                let Some(current) = self.lower_expression(target) else {
                    return flow;
                };
                let value = self.coerce_operand(&value, rhs, self.expression_type(target));
                binary(self.ctx, op, &current, &value)
            }
            None => value,
        };
        self.store(target, &value, flow)
    }

    /// `x++`, `x--` and the prefix forms as statements.
    fn lower_increment(&mut self, expr: &'a Expression, flow: FlowOutRef) -> FlowOutRef {
        let delta = match expr.operator() {
            "++" => 1,
            "--" => -1,
            other => {
                self.ctx
                    .diagnostics_mut()
                    .unsupported(format!("unary '{}' used as a statement", other));
                return flow;
            }
        };
        let Some(target) = expr.child(0).map(Expression::unwrapped) else {
            self.ctx.diagnostics_mut().malformed("increment without operand");
            return flow;
        };
        let Some(current) = self.lower_expression(target) else {
            return flow;
        };
        let step = match self.expression_type(target) {
            Some(ValueType::Float) => Literal::Float(delta as f32),
            _ => Literal::Int(delta),
        };
        let value = binary_literal(self.ctx, Op::MathAdd, &current, step);
        self.store(target, &value, flow)
    }

    /// Writes `value` into an assignable target and returns the continuation.
    fn store(&mut self, target: &'a Expression, value: &ValueOutRef, flow: FlowOutRef) -> FlowOutRef {
        match target.kind {
            ExpressionKind::Identifier => {
                let name = target.name.as_deref().unwrap_or_default();
                let Some(id) = self.assignable_variable(name) else {
                    self.ctx
                        .diagnostics_mut()
                        .unresolved(format!("assignment to unknown name '{}'", name));
                    return flow;
                };
                let set = set_variable_from(self.ctx, id, value);
                flow.connect_to_flow_destination(self.ctx, &set.flow_in);
                set.flow_out
            }
            ExpressionKind::MemberAccess => self.store_member(target, value, flow),
            ExpressionKind::ElementAccess => self.store_element(target, value, flow),
            other => {
                self.ctx
                    .diagnostics_mut()
                    .unsupported(format!("assignment to {:?}", other));
                flow
            }
        }
    }

    fn store_member(&mut self, target: &'a Expression, value: &ValueOutRef, flow: FlowOutRef) -> FlowOutRef {
        let Some(member) = target.member.as_ref() else {
            self.ctx.diagnostics_mut().malformed("member access without member");
            return flow;
        };
        let receiver = target.child(0);
        // `this.field = v`
        if receiver.is_none_or(|r| r.unwrapped().kind == ExpressionKind::This)
            && self.fields.contains_key(&member.name)
        {
            if let Some(&id) = self.fields.get(&member.name) {
                let set = set_variable_from(self.ctx, id, value);
                flow.connect_to_flow_destination(self.ctx, &set.flow_in);
                return set.flow_out;
            }
        }
        let property = BuiltinProperty::recognize(member).filter(BuiltinProperty::is_writable);
        let Some(property) = property else {
            self.ctx.diagnostics_mut().unsupported(format!(
                "assignment to member '{}.{}'",
                member.declaring_type.name, member.name
            ));
            return flow;
        };
        let object = self.lower_object(receiver);
        let set: PropertySet = match property {
            BuiltinProperty::Position => transform::world_position_set(self.ctx),
            BuiltinProperty::LocalPosition => transform::local_position_set(self.ctx),
            BuiltinProperty::Rotation => transform::world_rotation_set(self.ctx),
            BuiltinProperty::LocalRotation => transform::local_rotation_set(self.ctx),
            _ => transform::local_scale_set(self.ctx),
        };
        set.target.connect_to_source(self.ctx, &object);
        set.value.connect_to_source(self.ctx, value);
        flow.connect_to_flow_destination(self.ctx, &set.flow_in);
        set.flow_out
    }

    fn store_element(&mut self, target: &'a Expression, value: &ValueOutRef, flow: FlowOutRef) -> FlowOutRef {
        let (Some(collection), Some(index_expr)) = (target.child(0), target.child(1)) else {
            self.ctx
                .diagnostics_mut()
                .malformed("element access without collection and index");
            return flow;
        };
        let Some(name) = self.list_name(collection) else {
            self.ctx
                .diagnostics_mut()
                .unsupported("element assignment on something other than a list field");
            return flow;
        };
        let Some(index) = self.lower_expression(index_expr) else {
            return flow;
        };
        let Some(list) = self.lists.get_mut(&name) else {
            return flow;
        };
        let set = list.set_item_checked(self.ctx);
        set.index.connect_to_source(self.ctx, &index);
        set.value.connect_to_source(self.ctx, value);
        flow.connect_to_flow_destination(self.ctx, &set.flow_in);
        set.flow_out
    }

    /// Lowers an `if`/`else`. Both arms start from one `flow/branch`; a missing arm leaves
    /// its branch output as an open exit.
    pub(super) fn lower_if(&mut self, stmt: &'a Statement, flow: FlowOutRef) -> Exits {
        let condition = stmt
            .child(StatementKind::Condition)
            .and_then(Statement::expression);
        let Some(condition) = condition else {
            self.ctx.diagnostics_mut().malformed("if statement without condition");
            return Exits::open(flow);
        };
        let Some(condition) = self.lower_expression(condition) else {
            self.ctx
                .diagnostics_mut()
                .unsupported("if condition could not be lowered; statement skipped");
            return Exits::open(flow);
        };

        let branch = self.ctx.create_node(Op::FlowBranch);
        branch
            .value_in("condition")
            .connect_to_source(self.ctx, &condition);
        flow.connect_to_flow_destination(self.ctx, &branch.flow_in("in"));

        let mut exits = Exits::default();
        for (clause, socket) in [
            (StatementKind::ThenClause, "true"),
            (StatementKind::ElseClause, "false"),
        ] {
            let arm = branch.flow_out(socket);
            match stmt.child(clause) {
                Some(body) => exits.merge(self.walk_block(&body.children, arm)),
                None => exits.open.push(arm),
            }
        }
        exits
    }

    fn lower_return(&mut self, stmt: &'a Statement, flow: FlowOutRef) -> Exits {
        let Some(expr) = stmt.expression() else {
            return Exits::returned(flow);
        };
        let target = self.frame().and_then(|f| f.return_variable);
        let Some(target) = target else {
            // Entry points discard returned values.
            return Exits::returned(flow);
        };
        let (value, flow) = self.lower_value_with_flow(expr, flow);
        let Some(value) = value else {
            return Exits::returned(flow);
        };
        let set = set_variable_from(self.ctx, target, &value);
        flow.connect_to_flow_destination(self.ctx, &set.flow_in);
        Exits::returned(set.flow_out)
    }
}
