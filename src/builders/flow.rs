//! Loops, waits and delays assembled from the primitive flow nodes.

use super::math::select;
use super::variables::{get_variable, set_variable, set_variable_from, set_variable_static};
use crate::export::ExportContext;
use crate::graph::{
    ConfigValue, FlowInRef, FlowOutRef, Literal, NodeRef, Op, ValueInRef, ValueOutRef, ValueType,
    VariableId,
};

/// Ports of a native `flow/for` loop. The end index is exclusive.
#[derive(Debug, Clone)]
pub struct ForLoop {
    pub node: NodeRef,
    pub start: ValueInRef,
    pub end: ValueInRef,
    pub index: ValueOutRef,
    pub flow_in: FlowInRef,
    pub loop_body: FlowOutRef,
    pub completed: FlowOutRef,
}

pub fn for_loop(ctx: &mut ExportContext, initial_index: i32) -> ForLoop {
    let node = ctx.create_node(Op::FlowFor);
    node.set_config(ctx, "initialIndex", ConfigValue::Int(initial_index));
    ForLoop {
        node,
        start: node.value_in("startIndex"),
        end: node.value_in("endIndex"),
        index: node.value_out("index"),
        flow_in: node.flow_in("in"),
        loop_body: node.flow_out("loopBody"),
        completed: node.flow_out("completed"),
    }
}

/// A counting loop with an arbitrary step, built from variables and a branch.
///
/// The loop runs while the counter has not reached `end`, in the direction implied by
/// `start <= end`. The body must flow into `next_step` to advance; whatever does not
/// reach it ends the loop early.
#[derive(Debug, Clone)]
pub struct CustomForLoop {
    pub start: ValueInRef,
    pub end: ValueInRef,
    pub step: ValueInRef,
    pub flow_in: FlowInRef,
    pub next_step: FlowInRef,
    pub index: ValueOutRef,
    pub counter: VariableId,
    pub loop_body: FlowOutRef,
    pub completed: FlowOutRef,
}

pub fn custom_for_loop(ctx: &mut ExportContext) -> CustomForLoop {
    let name = ctx.unique_name("ForLoopIndex");
    let counter = ctx.add_variable_with_id_if_needed(&name, Some(Literal::Int(0)), ValueType::Int);

    let init = set_variable(ctx, counter);
    let branch = ctx.create_node(Op::FlowBranch);
    init.flow_out
        .connect_to_flow_destination(ctx, &branch.flow_in("in"));

    let index = get_variable(ctx, counter);

    // The bounds feed both the direction test and the continuation test.
    let start_end = ctx.create_node(Op::MathLe);
    let below = ctx.create_node(Op::MathLt);
    let above = ctx.create_node(Op::MathGt);
    below.value_in("a").connect_to_source(ctx, &index);
    above.value_in("a").connect_to_source(ctx, &index);
    let ascending = start_end.value_out("value");
    let condition = select(ctx, &ascending, &below.value_out("value"), &above.value_out("value"));
    branch
        .value_in("condition")
        .connect_to_source(ctx, &condition);

    let step = ctx.create_node(Op::MathAdd);
    step.value_in("a").connect_to_source(ctx, &index);
    let advance = set_variable_from(ctx, counter, &step.value_out("value"));
    advance
        .flow_out
        .connect_to_flow_destination(ctx, &branch.flow_in("in"));

    CustomForLoop {
        start: ValueInRef::link([init.value, start_end.value_in("a")]),
        end: ValueInRef::link([start_end.value_in("b"), below.value_in("b"), above.value_in("b")]),
        step: step.value_in("b"),
        flow_in: init.flow_in,
        next_step: advance.flow_in,
        index,
        counter,
        loop_body: branch.flow_out("true"),
        completed: branch.flow_out("false"),
    }
}

/// A `flow/while` whose body runs first and then a step, in that order, each iteration.
#[derive(Debug, Clone)]
pub struct SteppedWhile {
    pub condition: ValueInRef,
    pub flow_in: FlowInRef,
    pub body: FlowOutRef,
    pub step: FlowOutRef,
    pub completed: FlowOutRef,
}

pub fn stepped_while(ctx: &mut ExportContext) -> SteppedWhile {
    let node = ctx.create_node(Op::FlowWhile);
    let sequence = ctx.create_node(Op::FlowSequence);
    node.flow_out("loopBody")
        .connect_to_flow_destination(ctx, &sequence.flow_in("in"));
    SteppedWhile {
        condition: node.value_in("condition"),
        flow_in: node.flow_in("in"),
        body: sequence.flow_out("0"),
        step: sequence.flow_out("1"),
        completed: node.flow_out("completed"),
    }
}

/// The shared tick event and the sequence that fans its flow out to every subscriber.
///
/// Sequence ports are reserved when handed out, so a port is never given twice even while
/// its caller has not wired it yet. The sequence is created with the first subscriber; a
/// chain only read for its time outputs has none.
#[derive(Debug, Clone)]
pub struct TickChain {
    event: NodeRef,
    sequence: Option<NodeRef>,
    next_port: usize,
}

impl TickChain {
    pub fn new(ctx: &mut ExportContext) -> Self {
        Self {
            event: ctx.create_node(Op::EventOnTick),
            sequence: None,
            next_port: 0,
        }
    }

    /// The `event/onTick` node, for its time outputs.
    pub fn event(&self) -> NodeRef {
        self.event
    }

    /// Reserves the next free flow output behind the tick.
    pub fn next_flow(&mut self, ctx: &mut ExportContext) -> FlowOutRef {
        let sequence = match self.sequence {
            Some(sequence) => sequence,
            None => {
                let sequence = ctx.create_node(Op::FlowSequence);
                self.event
                    .flow_out("out")
                    .connect_to_flow_destination(ctx, &sequence.flow_in("in"));
                self.sequence = Some(sequence);
                sequence
            }
        };
        let port = sequence.flow_out(&self.next_port.to_string());
        self.next_port += 1;
        port
    }
}

/// Suspends a flow until a condition becomes true, re-checking once per tick.
#[derive(Debug, Clone)]
pub struct ConditionalWait {
    pub condition: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

/// Builds a wait that checks `condition` immediately and then on every tick until it holds.
///
/// A pending flag keeps the tick check from firing for waits that are not active. The
/// tick chain is shared through `tick`, creating one the first time it is needed.
pub fn wait_until(ctx: &mut ExportContext, tick: &mut Option<TickChain>) -> ConditionalWait {
    let name = ctx.unique_name("WaitPending");
    let pending = ctx.add_variable_with_id_if_needed(&name, Some(Literal::Bool(false)), ValueType::Bool);

    let arm = set_variable_static(ctx, pending, Literal::Bool(true));
    let check = ctx.create_node(Op::FlowBranch);
    arm.flow_out
        .connect_to_flow_destination(ctx, &check.flow_in("in"));
    let disarm = set_variable_static(ctx, pending, Literal::Bool(false));
    check
        .flow_out("true")
        .connect_to_flow_destination(ctx, &disarm.flow_in);

    let tick_out = tick
        .get_or_insert_with(|| TickChain::new(ctx))
        .next_flow(ctx);
    let gate = ctx.create_node(Op::FlowBranch);
    let is_pending = get_variable(ctx, pending);
    gate.value_in("condition")
        .connect_to_source(ctx, &is_pending);
    tick_out.connect_to_flow_destination(ctx, &gate.flow_in("in"));
    gate.flow_out("true")
        .connect_to_flow_destination(ctx, &check.flow_in("in"));

    ConditionalWait {
        condition: check.value_in("condition"),
        flow_in: arm.flow_in,
        flow_out: disarm.flow_out,
    }
}

/// Builds a wait that resumes once `condition` stops holding.
pub fn wait_while(ctx: &mut ExportContext, tick: &mut Option<TickChain>) -> ConditionalWait {
    let wait = wait_until(ctx, tick);
    let not = ctx.create_node(Op::MathNot);
    wait.condition
        .connect_to_source(ctx, &not.value_out("value"));
    ConditionalWait {
        condition: not.value_in("a"),
        ..wait
    }
}

/// Ports of a `flow/setDelay` whose duration is given in seconds or milliseconds.
#[derive(Debug, Clone)]
pub struct Delay {
    pub node: NodeRef,
    pub duration: ValueInRef,
    pub flow_in: FlowInRef,
    /// Fires immediately after the delay is scheduled.
    pub started: FlowOutRef,
    /// Fires once the delay elapses.
    pub done: FlowOutRef,
}

pub fn delay_seconds(ctx: &mut ExportContext) -> Delay {
    let node = ctx.create_node(Op::FlowSetDelay);
    Delay {
        node,
        duration: node.value_in("duration"),
        flow_in: node.flow_in("in"),
        started: node.flow_out("out"),
        done: node.flow_out("done"),
    }
}

/// Delay taking milliseconds. An integral duration is converted to float before scaling.
pub fn delay_milliseconds(ctx: &mut ExportContext, integral: bool) -> Delay {
    let delay = delay_seconds(ctx);
    let scale = ctx.create_node(Op::MathDiv);
    scale.value_in("b").set_value(ctx, Literal::Float(1000.0));
    delay
        .duration
        .connect_to_source(ctx, &scale.value_out("value"));
    let input = if integral {
        let convert = ctx.create_node(Op::TypeIntToFloat);
        scale
            .value_in("a")
            .connect_to_source(ctx, &convert.value_out("value"));
        convert.value_in("a")
    } else {
        scale.value_in("a")
    };
    Delay {
        duration: input,
        ..delay
    }
}
