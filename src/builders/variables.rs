use crate::export::ExportContext;
use crate::graph::{
    ConfigValue, ExpectedType, FlowInRef, FlowOutRef, Literal, NodeRef, Op, ValueInRef,
    ValueOutRef, VariableId,
};

/// Ports of a `variable/set` node.
#[derive(Debug, Clone)]
pub struct VariableSet {
    pub node: NodeRef,
    pub value: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

/// Reads a variable. The output carries the variable's declared type.
pub fn get_variable(ctx: &mut ExportContext, id: VariableId) -> ValueOutRef {
    let node = ctx.create_node(Op::VariableGet);
    node.set_config(ctx, "variable", ConfigValue::Int(id as i32));
    let value = node.value_out("value");
    if let Some(ty) = ctx.graph().variable(id).map(|v| v.value_type) {
        value.expected_type(ctx, ExpectedType::Exact(ty));
    }
    value
}

pub fn set_variable(ctx: &mut ExportContext, id: VariableId) -> VariableSet {
    let node = ctx.create_node(Op::VariableSet);
    node.set_config(ctx, "variable", ConfigValue::Int(id as i32));
    VariableSet {
        node,
        value: node.value_in("value"),
        flow_in: node.flow_in("in"),
        flow_out: node.flow_out("out"),
    }
}

pub fn set_variable_from(
    ctx: &mut ExportContext,
    id: VariableId,
    value: &ValueOutRef,
) -> VariableSet {
    let set = set_variable(ctx, id);
    set.value.connect_to_source(ctx, value);
    set
}

pub fn set_variable_static(ctx: &mut ExportContext, id: VariableId, value: Literal) -> VariableSet {
    let set = set_variable(ctx, id);
    set.value.set_value(ctx, value);
    set
}
