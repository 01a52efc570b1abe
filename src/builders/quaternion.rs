use super::math::{binary, binary_literal, unary};
use crate::export::ExportContext;
use crate::graph::{Literal, Op, ValueOutRef};

/// Component signs that turn a unit quaternion into its inverse.
pub const CONJUGATE_FLIP: [f32; 4] = [-1.0, -1.0, -1.0, 1.0];

/// Quaternion for an Euler rotation given in degrees, applied Z, then X, then Y.
pub fn from_euler_degrees(ctx: &mut ExportContext, euler: &ValueOutRef) -> ValueOutRef {
    let radians = unary(ctx, Op::MathRad, euler);
    from_euler_radians(ctx, &radians)
}

/// Quaternion for an Euler rotation given in radians, applied Z, then X, then Y.
///
/// Computed component-wise as `A + B * (1, -1, -1, 1)` with
/// `A = (sx cy cz, cx sy cz, cx cy sz, cx cy cz)` and
/// `B = (cx sy sz, sx cy sz, sx sy cz, sx sy sz)` over the half angles.
pub fn from_euler_radians(ctx: &mut ExportContext, euler: &ValueOutRef) -> ValueOutRef {
    let half = binary_literal(ctx, Op::MathMul, euler, Literal::Float3([0.5, 0.5, 0.5]));
    let sin = unary(ctx, Op::MathSin, &half);
    let cos = unary(ctx, Op::MathCos, &half);
    let [sx, sy, sz] = extract3(ctx, &sin);
    let [cx, cy, cz] = extract3(ctx, &cos);

    let a0 = combine4(ctx, [&sx, &cx, &cx, &cx]);
    let a1 = combine4(ctx, [&cy, &sy, &cy, &cy]);
    let a2 = combine4(ctx, [&cz, &cz, &sz, &cz]);
    let b0 = combine4(ctx, [&cx, &sx, &sx, &sx]);
    let b1 = combine4(ctx, [&sy, &cy, &sy, &sy]);
    let b2 = combine4(ctx, [&sz, &sz, &cz, &sz]);

    let a01 = binary(ctx, Op::MathMul, &a0, &a1);
    let a_term = binary(ctx, Op::MathMul, &a01, &a2);
    let b01 = binary(ctx, Op::MathMul, &b0, &b1);
    let b012 = binary(ctx, Op::MathMul, &b01, &b2);
    let b_term = binary_literal(ctx, Op::MathMul, &b012, Literal::Float4([1.0, -1.0, -1.0, 1.0]));
    binary(ctx, Op::MathAdd, &a_term, &b_term)
}

fn extract3(ctx: &mut ExportContext, vector: &ValueOutRef) -> [ValueOutRef; 3] {
    let node = ctx.create_node(Op::MathExtract3);
    node.value_in("a").connect_to_source(ctx, vector);
    [node.value_out("0"), node.value_out("1"), node.value_out("2")]
}

fn combine4(ctx: &mut ExportContext, parts: [&ValueOutRef; 4]) -> ValueOutRef {
    let node = ctx.create_node(Op::MathCombine4);
    for (socket, part) in ["a", "b", "c", "d"].into_iter().zip(parts) {
        node.value_in(socket).connect_to_source(ctx, part);
    }
    node.value_out("value")
}

/// Inverse of a unit quaternion, as a sign-flip multiply.
///
/// For a unit quaternion the conjugate `(-x, -y, -z, w)` is the inverse, so the
/// components keep their order and only the vector part changes sign. Nothing
/// is normalized here: a non-unit input yields its conjugate, not its inverse.
pub fn invert(ctx: &mut ExportContext, rotation: &ValueOutRef) -> ValueOutRef {
    binary_literal(ctx, Op::MathMul, rotation, Literal::Float4(CONJUGATE_FLIP))
}

/// Hamilton product `a * b`: rotate by `b`, then by `a`.
pub fn multiply(ctx: &mut ExportContext, a: &ValueOutRef, b: &ValueOutRef) -> ValueOutRef {
    binary(ctx, Op::MathQuatMul, a, b)
}
