//! Transform property reads and writes, built on pointers plus space conversion.
//!
//! Every builder returns its `target` input unconnected. The caller feeds it the object's
//! target id; when a builder reads several pointers, `target` is linked to all of them.

use super::math::{binary, binary_literal, unary};
use super::pointers::{self, PointerGet, PointerSet, pointer_get, pointer_set};
use super::{quaternion, space};
use crate::export::ExportContext;
use crate::graph::{FlowInRef, FlowOutRef, Literal, Op, ValueInRef, ValueOutRef, ValueType};

#[derive(Debug, Clone)]
pub struct PropertyGet {
    pub target: ValueInRef,
    pub value: ValueOutRef,
}

#[derive(Debug, Clone)]
pub struct PropertySet {
    pub target: ValueInRef,
    pub value: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

impl From<PointerSet> for PropertySet {
    fn from(set: PointerSet) -> Self {
        Self {
            target: set.target,
            value: set.value,
            flow_in: set.flow_in,
            flow_out: set.flow_out,
        }
    }
}

pub fn local_position_get(ctx: &mut ExportContext) -> PropertyGet {
    let get = pointer_get(ctx, pointers::TRANSLATION, ValueType::Float3);
    let value = space::convert_position(ctx, &get.value);
    PropertyGet {
        target: get.target,
        value,
    }
}

pub fn local_position_set(ctx: &mut ExportContext) -> PropertySet {
    let set = pointer_set(ctx, pointers::TRANSLATION, ValueType::Float3);
    let value = space::position_into(ctx, &set.value);
    PropertySet { value, ..set.into() }
}

pub fn local_rotation_get(ctx: &mut ExportContext) -> PropertyGet {
    let get = pointer_get(ctx, pointers::ROTATION, ValueType::Float4);
    let value = space::convert_rotation(ctx, &get.value);
    PropertyGet {
        target: get.target,
        value,
    }
}

pub fn local_rotation_set(ctx: &mut ExportContext) -> PropertySet {
    let set = pointer_set(ctx, pointers::ROTATION, ValueType::Float4);
    let value = space::rotation_into(ctx, &set.value);
    PropertySet { value, ..set.into() }
}

pub fn local_scale_get(ctx: &mut ExportContext) -> PropertyGet {
    let get = pointer_get(ctx, pointers::SCALE, ValueType::Float3);
    PropertyGet {
        target: get.target,
        value: get.value,
    }
}

pub fn local_scale_set(ctx: &mut ExportContext) -> PropertySet {
    pointer_set(ctx, pointers::SCALE, ValueType::Float3).into()
}

fn decomposed_world_matrix(ctx: &mut ExportContext) -> (PointerGet, crate::graph::NodeRef) {
    let matrix = pointer_get(ctx, pointers::GLOBAL_MATRIX, ValueType::Float4x4);
    let decompose = ctx.create_node(Op::MathMatDecompose);
    decompose.value_in("a").connect_to_source(ctx, &matrix.value);
    (matrix, decompose)
}

pub fn world_position_get(ctx: &mut ExportContext) -> PropertyGet {
    let (matrix, decompose) = decomposed_world_matrix(ctx);
    let value = space::convert_position(ctx, &decompose.value_out("translation"));
    PropertyGet {
        target: matrix.target,
        value,
    }
}

pub fn world_rotation_get(ctx: &mut ExportContext) -> PropertyGet {
    let (matrix, decompose) = decomposed_world_matrix(ctx);
    let value = space::convert_rotation(ctx, &decompose.value_out("rotation"));
    PropertyGet {
        target: matrix.target,
        value,
    }
}

pub fn world_scale_get(ctx: &mut ExportContext) -> PropertyGet {
    let (matrix, decompose) = decomposed_world_matrix(ctx);
    PropertyGet {
        target: matrix.target,
        value: decompose.value_out("scale"),
    }
}

/// Writes a world-space position by moving it into the parent's space first.
///
/// The parent matrix is recovered as `global * inverse(local)`, then the point is transformed
/// by its inverse and written as the local translation.
pub fn world_position_set(ctx: &mut ExportContext) -> PropertySet {
    let global = pointer_get(ctx, pointers::GLOBAL_MATRIX, ValueType::Float4x4);
    let local = pointer_get(ctx, pointers::MATRIX, ValueType::Float4x4);
    let set = pointer_set(ctx, pointers::TRANSLATION, ValueType::Float3);

    let local_inverse = unary(ctx, Op::MathInverse, &local.value);
    let parent = binary(ctx, Op::MathMatMul, &global.value, &local_inverse);
    let parent_inverse = unary(ctx, Op::MathInverse, &parent);

    let split = ctx.create_node(Op::MathExtract3);
    let value = space::position_into(ctx, &split.value_in("a"));
    let point = ctx.create_node(Op::MathCombine4);
    for (i, socket) in ["a", "b", "c"].into_iter().enumerate() {
        point
            .value_in(socket)
            .connect_to_source(ctx, &split.value_out(&i.to_string()));
    }
    point.value_in("d").set_value(ctx, Literal::Float(1.0));

    let transform = ctx.create_node(Op::MathTransform);
    transform.value_in("a").connect_to_source(ctx, &parent_inverse);
    transform
        .value_in("b")
        .connect_to_source(ctx, &point.value_out("value"));

    let local_point = ctx.create_node(Op::MathExtract4);
    local_point
        .value_in("a")
        .connect_to_source(ctx, &transform.value_out("value"));
    let translation = ctx.create_node(Op::MathCombine3);
    for (i, socket) in ["a", "b", "c"].into_iter().enumerate() {
        translation
            .value_in(socket)
            .connect_to_source(ctx, &local_point.value_out(&i.to_string()));
    }
    set.value
        .connect_to_source(ctx, &translation.value_out("value"));

    PropertySet {
        target: ValueInRef::link([global.target, local.target, set.target]),
        value,
        flow_in: set.flow_in,
        flow_out: set.flow_out,
    }
}

/// Writes a world-space rotation as `inverse(parent) * world`, where the parent rotation is
/// `world_current * inverse(local_current)`.
pub fn world_rotation_set(ctx: &mut ExportContext) -> PropertySet {
    let (matrix, decompose) = decomposed_world_matrix(ctx);
    let local = pointer_get(ctx, pointers::ROTATION, ValueType::Float4);
    let set = pointer_set(ctx, pointers::ROTATION, ValueType::Float4);

    let local_inverse = quaternion::invert(ctx, &local.value);
    let parent = quaternion::multiply(ctx, &decompose.value_out("rotation"), &local_inverse);
    let parent_inverse = quaternion::invert(ctx, &parent);

    let combine = ctx.create_node(Op::MathQuatMul);
    combine.value_in("a").connect_to_source(ctx, &parent_inverse);
    set.value
        .connect_to_source(ctx, &combine.value_out("value"));
    let value = space::rotation_into(ctx, &combine.value_in("b"));

    PropertySet {
        target: ValueInRef::link([matrix.target, local.target, set.target]),
        value,
        flow_in: set.flow_in,
        flow_out: set.flow_out,
    }
}

/// Toggles an object's active state: visibility first, then selectability.
pub fn active_set(ctx: &mut ExportContext) -> PropertySet {
    let visible = pointer_set(ctx, pointers::VISIBLE, ValueType::Bool);
    let selectable = pointer_set(ctx, pointers::SELECTABLE, ValueType::Bool);
    visible
        .flow_out
        .connect_to_flow_destination(ctx, &selectable.flow_in);
    PropertySet {
        target: ValueInRef::link([visible.target, selectable.target]),
        value: ValueInRef::link([visible.value, selectable.value]),
        flow_in: visible.flow_in,
        flow_out: selectable.flow_out,
    }
}

/// A transform command that consumes its operands at build time and only exposes flow.
#[derive(Debug, Clone)]
pub struct TransformAction {
    pub target: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

/// Adds `offset` to the local position: read, add, write.
pub fn translate(ctx: &mut ExportContext, offset: &ValueOutRef) -> TransformAction {
    let current = local_position_get(ctx);
    let set = local_position_set(ctx);
    let moved = binary(ctx, Op::MathAdd, &current.value, offset);
    set.value.connect_to_source(ctx, &moved);
    TransformAction {
        target: ValueInRef::link([current.target, set.target]),
        flow_in: set.flow_in,
        flow_out: set.flow_out,
    }
}

/// Applies `rotation` after the current local rotation (self space).
pub fn rotate(ctx: &mut ExportContext, rotation: &ValueOutRef) -> TransformAction {
    let current = local_rotation_get(ctx);
    let set = local_rotation_set(ctx);
    let rotated = quaternion::multiply(ctx, &current.value, rotation);
    set.value.connect_to_source(ctx, &rotated);
    TransformAction {
        target: ValueInRef::link([current.target, set.target]),
        flow_in: set.flow_in,
        flow_out: set.flow_out,
    }
}

/// Turns the object so its forward axis points at `point` (world space), keeping it upright.
pub fn look_at(ctx: &mut ExportContext, point: &ValueOutRef) -> TransformAction {
    let position = world_position_get(ctx);
    let set = world_rotation_set(ctx);

    let direction = binary(ctx, Op::MathSub, point, &position.value);
    let split = ctx.create_node(Op::MathExtract3);
    split.value_in("a").connect_to_source(ctx, &direction);
    let (dx, dy, dz) = (
        split.value_out("0"),
        split.value_out("1"),
        split.value_out("2"),
    );

    let yaw = binary(ctx, Op::MathAtan2, &dx, &dz);
    let horizontal = ctx.create_node(Op::MathCombine2);
    horizontal.value_in("a").connect_to_source(ctx, &dx);
    horizontal.value_in("b").connect_to_source(ctx, &dz);
    let ground = unary(ctx, Op::MathLength, &horizontal.value_out("value"));
    let rise = binary(ctx, Op::MathAtan2, &dy, &ground);
    let pitch = binary_literal(ctx, Op::MathMul, &rise, Literal::Float(-1.0));

    let euler = ctx.create_node(Op::MathCombine3);
    euler.value_in("a").connect_to_source(ctx, &pitch);
    euler.value_in("b").connect_to_source(ctx, &yaw);
    euler.value_in("c").set_value(ctx, Literal::Float(0.0));
    let rotation = quaternion::from_euler_radians(ctx, &euler.value_out("value"));
    set.value.connect_to_source(ctx, &rotation);

    TransformAction {
        target: ValueInRef::link([position.target, set.target]),
        flow_in: set.flow_in,
        flow_out: set.flow_out,
    }
}
