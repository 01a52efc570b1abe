//! Reads and writes of host state through templated pointer paths.
//!
//! Pointer nodes are the only way lowered code reaches host state. Every template carries a
//! `{nodeIndex}` token whose value is the target id supplied on the matching value input.

use crate::export::ExportContext;
use crate::graph::{
    ConfigValue, ExpectedType, FlowInRef, FlowOutRef, NodeRef, Op, TypeRestriction, ValueInRef,
    ValueOutRef, ValueType, template_placeholders,
};

pub const NODE_INDEX: &str = "nodeIndex";

pub const TRANSLATION: &str = "/nodes/{nodeIndex}/translation";
pub const ROTATION: &str = "/nodes/{nodeIndex}/rotation";
pub const SCALE: &str = "/nodes/{nodeIndex}/scale";
pub const MATRIX: &str = "/nodes/{nodeIndex}/matrix";
pub const GLOBAL_MATRIX: &str = "/nodes/{nodeIndex}/globalMatrix";
pub const VISIBLE: &str = "/nodes/{nodeIndex}/extensions/KHR_node_visibility/visible";
pub const SELECTABLE: &str = "/nodes/{nodeIndex}/extensions/KHR_node_selectability/selectable";

#[derive(Debug, Clone)]
pub struct PointerGet {
    pub node: NodeRef,
    pub target: ValueInRef,
    pub value: ValueOutRef,
    pub is_valid: ValueOutRef,
}

#[derive(Debug, Clone)]
pub struct PointerSet {
    pub node: NodeRef,
    pub target: ValueInRef,
    pub value: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

fn configure_pointer(ctx: &mut ExportContext, node: NodeRef, template: &str, ty: ValueType) {
    node.set_config(ctx, "pointer", ConfigValue::Text(template.to_string()));
    node.set_config(ctx, "type", ConfigValue::Text(ty.name().to_string()));
    for name in template_placeholders(template) {
        node.value_in(&name)
            .set_type(ctx, TypeRestriction::Only(ValueType::Int));
    }
}

pub fn pointer_get(ctx: &mut ExportContext, template: &str, ty: ValueType) -> PointerGet {
    let node = ctx.create_node(Op::PointerGet);
    configure_pointer(ctx, node, template, ty);
    let value = node.value_out("value");
    value.expected_type(ctx, ExpectedType::Exact(ty));
    PointerGet {
        node,
        target: node.value_in(NODE_INDEX),
        value,
        is_valid: node.value_out("isValid"),
    }
}

pub fn pointer_set(ctx: &mut ExportContext, template: &str, ty: ValueType) -> PointerSet {
    let node = ctx.create_node(Op::PointerSet);
    configure_pointer(ctx, node, template, ty);
    let value = node.value_in("value");
    value.set_type(ctx, TypeRestriction::Only(ty));
    PointerSet {
        node,
        target: node.value_in(NODE_INDEX),
        value,
        flow_in: node.flow_in("in"),
        flow_out: node.flow_out("out"),
    }
}
