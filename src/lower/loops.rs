use super::{Exits, Expression, ExpressionKind, Statement, StatementKind, Walker, constant};
use crate::builders::flow::{custom_for_loop, for_loop};
use crate::builders::math::{binary_literal, unary};
use crate::builders::variables::set_variable_from;
use crate::graph::{FlowOutRef, Literal, Op, ValueOutRef, ValueType, VariableId};
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn parse(operator: &str) -> Option<Self> {
        match operator {
            "<" => Some(Comparison::Lt),
            "<=" => Some(Comparison::Le),
            ">" => Some(Comparison::Gt),
            ">=" => Some(Comparison::Ge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step<'e> {
    Constant(i32),
    /// A computed step, subtracted instead of added when `negate` is set.
    Computed { value: &'e Expression, negate: bool },
}

/// A counting loop recognized from the three `for` header clauses.
#[derive(Debug)]
struct LoopShape<'e> {
    counter: String,
    declared: bool,
    start: &'e Expression,
    comparison: Comparison,
    bound: &'e Expression,
    step: Step<'e>,
    body: &'e [Statement],
}

fn is_header(kind: StatementKind) -> bool {
    matches!(
        kind,
        StatementKind::ForInitializer | StatementKind::ForCondition | StatementKind::ForIncrementor
    )
}

fn identifier(expr: &Expression) -> Option<&str> {
    let expr = expr.unwrapped();
    match expr.kind {
        ExpressionKind::Identifier => expr.name.as_deref(),
        _ => None,
    }
}

impl<'e> LoopShape<'e> {
    fn parse(stmt: &'e Statement) -> Option<Self> {
        let (counter, start, declared) = Self::initializer(stmt.child(StatementKind::ForInitializer)?)?;

        let condition = stmt
            .child(StatementKind::ForCondition)?
            .expression()?
            .unwrapped();
        if condition.kind != ExpressionKind::Binary || identifier(condition.child(0)?)? != counter {
            return None;
        }
        let comparison = Comparison::parse(condition.operator())?;
        let bound = condition.child(1)?;

        let step = Self::step(stmt.child(StatementKind::ForIncrementor)?, &counter)?;

        let body_start = stmt
            .children
            .iter()
            .position(|c| !is_header(c.kind))
            .unwrap_or(stmt.children.len());

        Some(LoopShape {
            counter,
            declared,
            start,
            comparison,
            bound,
            step,
            body: &stmt.children[body_start..],
        })
    }

    /// `int i = e` or `i = e`.
    fn initializer(init: &'e Statement) -> Option<(String, &'e Expression, bool)> {
        if let Some(declaration) = init.child(StatementKind::Declaration) {
            let declarator = declaration
                .children
                .iter()
                .filter(|c| c.kind == StatementKind::VariableDeclarator)
                .exactly_one()
                .ok()?;
            let name = declarator.expression()?.name.clone()?;
            let value = declarator.child(StatementKind::Initializer)?.expression()?;
            return Some((name, value, true));
        }
        let assignment = init.expression()?.unwrapped();
        if assignment.kind != ExpressionKind::Assignment || !matches!(assignment.operator(), "=" | "") {
            return None;
        }
        let name = identifier(assignment.child(0)?)?.to_string();
        Some((name, assignment.child(1)?, false))
    }

    /// `i++`, `i--`, `i += e`, `i -= e`, `i = i + e` and `i = i - e`.
    fn step(incrementor: &'e Statement, counter: &str) -> Option<Step<'e>> {
        let expr = incrementor.expression()?.unwrapped();
        let (operator, amount) = match expr.kind {
            ExpressionKind::PostfixUnary | ExpressionKind::PrefixUnary => {
                if identifier(expr.child(0)?)? != counter {
                    return None;
                }
                return match expr.operator() {
                    "++" => Some(Step::Constant(1)),
                    "--" => Some(Step::Constant(-1)),
                    _ => None,
                };
            }
            ExpressionKind::Assignment => {
                if identifier(expr.child(0)?)? != counter {
                    return None;
                }
                let rhs = expr.child(1)?;
                match expr.operator() {
                    "+=" => ("+", rhs),
                    "-=" => ("-", rhs),
                    "=" | "" => {
                        let rhs = rhs.unwrapped();
                        if rhs.kind != ExpressionKind::Binary || identifier(rhs.child(0)?)? != counter {
                            return None;
                        }
                        match rhs.operator() {
                            "+" => ("+", rhs.child(1)?),
                            "-" => ("-", rhs.child(1)?),
                            _ => return None,
                        }
                    }
                    _ => return None,
                }
            }
            _ => return None,
        };
        let negate = operator == "-";
        let step = match constant(amount, Some(ValueType::Int)).and_then(|l| l.as_int()) {
            Some(n) if negate => Step::Constant(-n),
            Some(n) => Step::Constant(n),
            None => Step::Computed {
                value: amount,
                negate,
            },
        };
        Some(step)
    }

    /// Declared counter, `<` against a bound the body cannot change, unit step, and a body
    /// that neither suspends nor writes the counter.
    fn is_canonical(&self) -> bool {
        let mut writes = Vec::new();
        let mut suspends = false;
        for stmt in self.body {
            collect_statement_writes(stmt, &mut writes, &mut suspends);
        }
        let mut reads = Vec::new();
        let mut calls = false;
        collect_reads(self.bound, &mut reads, &mut calls);

        self.declared
            && self.comparison == Comparison::Lt
            && matches!(self.step, Step::Constant(1))
            && !suspends
            && !calls
            && !writes.contains(&self.counter.as_str())
            && !reads.iter().any(|name| writes.contains(name))
    }
}

fn collect_statement_writes<'e>(stmt: &'e Statement, writes: &mut Vec<&'e str>, suspends: &mut bool) {
    for expr in &stmt.expressions {
        collect_writes(expr, writes, suspends);
    }
    for child in &stmt.children {
        collect_statement_writes(child, writes, suspends);
    }
}

/// Names an expression may write: assignment and increment targets and call receivers.
fn collect_writes<'e>(expr: &'e Expression, writes: &mut Vec<&'e str>, suspends: &mut bool) {
    match expr.kind {
        ExpressionKind::Assignment | ExpressionKind::PostfixUnary | ExpressionKind::PrefixUnary => {
            if let Some(name) = expr.child(0).and_then(identifier) {
                writes.push(name);
            }
        }
        ExpressionKind::MethodInvocation => {
            if let Some(name) = expr.child(0).and_then(identifier) {
                writes.push(name);
            }
        }
        ExpressionKind::Await => *suspends = true,
        _ => {}
    }
    for child in &expr.children {
        collect_writes(child, writes, suspends);
    }
}

fn collect_reads<'e>(expr: &'e Expression, reads: &mut Vec<&'e str>, calls: &mut bool) {
    match expr.kind {
        ExpressionKind::Identifier => {
            if let Some(name) = expr.name.as_deref() {
                reads.push(name);
            }
        }
        ExpressionKind::MethodInvocation => *calls = true,
        _ => {}
    }
    for child in &expr.children {
        collect_reads(child, reads, calls);
    }
}

impl<'a> Walker<'a> {
    /// Lowers a `for` statement. Counting loops become a native `flow/for` when their shape
    /// allows it and a counter-variable loop otherwise; anything else is reported and skipped.
    pub(super) fn lower_for(&mut self, stmt: &'a Statement, flow: FlowOutRef) -> Exits {
        let Some(shape) = LoopShape::parse(stmt) else {
            self.ctx
                .diagnostics_mut()
                .unsupported("for loop is not a counting loop over an int counter");
            return Exits::open(flow);
        };
        let counter_type = self.expression_type(shape.start);
        if counter_type.is_some_and(|ty| ty != ValueType::Int) {
            self.ctx.diagnostics_mut().unsupported(format!(
                "for loop counter '{}' is not an int",
                shape.counter
            ));
            return Exits::open(flow);
        }

        if shape.is_canonical() {
            tracing::debug!(counter = %shape.counter, "lowering canonical for loop");
            self.lower_canonical_for(&shape, flow)
        } else {
            tracing::debug!(counter = %shape.counter, comparison = ?shape.comparison, "lowering custom for loop");
            self.lower_custom_for(&shape, flow)
        }
    }

    fn lower_canonical_for(&mut self, shape: &LoopShape<'a>, flow: FlowOutRef) -> Exits {
        let start = self.lower_expression(shape.start);
        let end = self.lower_expression(shape.bound);
        let (Some(start), Some(end)) = (start, end) else {
            return Exits::open(flow);
        };
        let initial = constant(shape.start, Some(ValueType::Int))
            .and_then(|l| l.as_int())
            .unwrap_or(0);

        let native = for_loop(self.ctx, initial);
        native.start.connect_to_source(self.ctx, &start);
        native.end.connect_to_source(self.ctx, &end);
        flow.connect_to_flow_destination(self.ctx, &native.flow_in);

        let shadowed = self.bind_counter(&shape.counter, Counter::Value(native.index.clone()));
        let body = self.walk_block(shape.body, native.loop_body);
        self.unbind_counter(&shape.counter, shadowed);

        Exits {
            open: vec![native.completed],
            returned: body.returned,
        }
    }

    fn lower_custom_for(&mut self, shape: &LoopShape<'a>, flow: FlowOutRef) -> Exits {
        // An existing counter keeps its final value after the loop.
        let outer = if shape.declared {
            None
        } else {
            self.assignable_variable(&shape.counter)
        };

        let start = self.lower_expression(shape.start);
        let bound = self.lower_expression(shape.bound);
        let (Some(start), Some(bound)) = (start, bound) else {
            return Exits::open(flow);
        };
        let end = match shape.comparison {
            Comparison::Lt | Comparison::Gt => bound,
            Comparison::Le => binary_literal(self.ctx, Op::MathAdd, &bound, Literal::Int(1)),
            Comparison::Ge => binary_literal(self.ctx, Op::MathSub, &bound, Literal::Int(1)),
        };

        let custom = custom_for_loop(self.ctx);
        custom.start.connect_to_source(self.ctx, &start);
        custom.end.connect_to_source(self.ctx, &end);
        match shape.step {
            Step::Constant(n) => {
                custom.step.set_value(self.ctx, Literal::Int(n));
            }
            Step::Computed { value, negate } => {
                if let Some(step) = self.lower_expression(value) {
                    let step = if negate {
                        unary(self.ctx, Op::MathNeg, &step)
                    } else {
                        step
                    };
                    custom.step.connect_to_source(self.ctx, &step);
                }
            }
        }
        flow.connect_to_flow_destination(self.ctx, &custom.flow_in);

        let shadowed = self.bind_counter(&shape.counter, Counter::Variable(custom.counter));
        let body = self.walk_block(shape.body, custom.loop_body);
        self.unbind_counter(&shape.counter, shadowed);
        for tail in &body.open {
            tail.connect_to_flow_destination(self.ctx, &custom.next_step);
        }

        let completed = match outer {
            Some(id) => {
                let sync = set_variable_from(self.ctx, id, &custom.index);
                custom
                    .completed
                    .connect_to_flow_destination(self.ctx, &sync.flow_in);
                sync.flow_out
            }
            None => custom.completed,
        };
        Exits {
            open: vec![completed],
            returned: body.returned,
        }
    }

    fn bind_counter(&mut self, name: &str, counter: Counter) -> Option<Counter> {
        let frame = self.frame_mut()?;
        let previous = match frame.bindings.remove(name) {
            Some(value) => Some(Counter::Value(value)),
            None => frame.locals.remove(name).map(Counter::Variable),
        };
        match counter {
            Counter::Value(value) => {
                frame.bindings.insert(name.to_string(), value);
            }
            Counter::Variable(id) => {
                frame.locals.insert(name.to_string(), id);
            }
        }
        previous
    }

    fn unbind_counter(&mut self, name: &str, previous: Option<Counter>) {
        let Some(frame) = self.frame_mut() else {
            return;
        };
        frame.bindings.remove(name);
        frame.locals.remove(name);
        match previous {
            Some(Counter::Value(value)) => {
                frame.bindings.insert(name.to_string(), value);
            }
            Some(Counter::Variable(id)) => {
                frame.locals.insert(name.to_string(), id);
            }
            None => {}
        }
    }
}

/// How a loop counter is visible to the body.
#[derive(Debug, Clone)]
enum Counter {
    /// The native loop's index output.
    Value(ValueOutRef),
    Variable(VariableId),
}
