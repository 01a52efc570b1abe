//! One-node arithmetic helpers shared by the other builders and the walker.

use crate::export::ExportContext;
use crate::graph::{Literal, Op, ValueOutRef};

pub fn unary(ctx: &mut ExportContext, op: Op, a: &ValueOutRef) -> ValueOutRef {
    let node = ctx.create_node(op);
    node.value_in("a").connect_to_source(ctx, a);
    node.value_out("value")
}

pub fn binary(ctx: &mut ExportContext, op: Op, a: &ValueOutRef, b: &ValueOutRef) -> ValueOutRef {
    let node = ctx.create_node(op);
    node.value_in("a").connect_to_source(ctx, a);
    node.value_in("b").connect_to_source(ctx, b);
    node.value_out("value")
}

/// Binary operation whose right operand is a constant.
pub fn binary_literal(ctx: &mut ExportContext, op: Op, a: &ValueOutRef, b: Literal) -> ValueOutRef {
    let node = ctx.create_node(op);
    node.value_in("a").connect_to_source(ctx, a);
    node.value_in("b").set_value(ctx, b);
    node.value_out("value")
}

pub fn select(
    ctx: &mut ExportContext,
    condition: &ValueOutRef,
    if_true: &ValueOutRef,
    if_false: &ValueOutRef,
) -> ValueOutRef {
    let node = ctx.create_node(Op::MathSelect);
    node.value_in("condition").connect_to_source(ctx, condition);
    node.value_in("a").connect_to_source(ctx, if_true);
    node.value_in("b").connect_to_source(ctx, if_false);
    node.value_out("value")
}

const COMPONENT_SOCKETS: [&str; 4] = ["a", "b", "c", "d"];

/// Builds a vector from two to four scalar parts. Returns `None` for any other count.
pub fn combine(ctx: &mut ExportContext, parts: &[ValueOutRef]) -> Option<ValueOutRef> {
    let op = match parts.len() {
        2 => Op::MathCombine2,
        3 => Op::MathCombine3,
        4 => Op::MathCombine4,
        _ => return None,
    };
    let node = ctx.create_node(op);
    for (socket, part) in COMPONENT_SOCKETS.iter().zip(parts) {
        node.value_in(socket).connect_to_source(ctx, part);
    }
    Some(node.value_out("value"))
}

/// Splits a vector of `count` components into scalar outputs.
pub fn extract(ctx: &mut ExportContext, vector: &ValueOutRef, count: usize) -> Option<Vec<ValueOutRef>> {
    let op = match count {
        2 => Op::MathExtract2,
        3 => Op::MathExtract3,
        4 => Op::MathExtract4,
        _ => return None,
    };
    let node = ctx.create_node(op);
    node.value_in("a").connect_to_source(ctx, vector);
    Some(
        (0..count)
            .map(|i| node.value_out(&i.to_string()))
            .collect(),
    )
}
