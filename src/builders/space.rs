//! Conversion between the host's left-handed space and the exchange format's right-handed one.
//!
//! Both flips are their own inverse, so the same multiply serves reads and writes. The
//! property builders apply them; nothing else needs to know the conventions differ.

use crate::export::ExportContext;
use crate::graph::{Literal, Op, ValueInRef, ValueOutRef};

pub const POSITION_FLIP: [f32; 3] = [-1.0, 1.0, 1.0];
pub const ROTATION_FLIP: [f32; 4] = [1.0, -1.0, -1.0, 1.0];

fn flip(ctx: &mut ExportContext, factor: Literal) -> (ValueInRef, ValueOutRef) {
    let mul = ctx.create_node(Op::MathMul);
    mul.value_in("b").set_value(ctx, factor);
    (mul.value_in("a"), mul.value_out("value"))
}

fn convert(ctx: &mut ExportContext, value: &ValueOutRef, factor: Literal) -> ValueOutRef {
    if !ctx.options().space_conversion {
        return value.clone();
    }
    let (input, output) = flip(ctx, factor);
    input.connect_to_source(ctx, value);
    output
}

fn convert_into(ctx: &mut ExportContext, sink: &ValueInRef, factor: Literal) -> ValueInRef {
    if !ctx.options().space_conversion {
        return sink.clone();
    }
    let (input, output) = flip(ctx, factor);
    sink.connect_to_source(ctx, &output);
    input
}

pub fn convert_position(ctx: &mut ExportContext, value: &ValueOutRef) -> ValueOutRef {
    convert(ctx, value, Literal::Float3(POSITION_FLIP))
}

pub fn convert_rotation(ctx: &mut ExportContext, value: &ValueOutRef) -> ValueOutRef {
    convert(ctx, value, Literal::Float4(ROTATION_FLIP))
}

/// Returns an input that feeds `sink` with the converted position.
pub fn position_into(ctx: &mut ExportContext, sink: &ValueInRef) -> ValueInRef {
    convert_into(ctx, sink, Literal::Float3(POSITION_FLIP))
}

/// Returns an input that feeds `sink` with the converted rotation.
pub fn rotation_into(ctx: &mut ExportContext, sink: &ValueInRef) -> ValueInRef {
    convert_into(ctx, sink, Literal::Float4(ROTATION_FLIP))
}
