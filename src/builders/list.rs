//! A fixed-capacity list emulated over scalar variables.
//!
//! The runtime has no addressable memory, so a list of capacity `n` is `n` backing variables
//! plus a count. Indexed reads go through a `math/switch` over the backing reads; indexed
//! writes go through one shared `flow/switch` keyed by a scratch index variable. Every
//! mutation is O(capacity).
//!
//! The list also keeps a compile-time view of its contents through the backing variables'
//! initial values, which is how field initializers are pre-filled.

use super::flow::{for_loop, stepped_while};
use super::math::{binary, binary_literal};
use super::variables::{get_variable, set_variable, set_variable_from};
use crate::error::ListError;
use crate::export::ExportContext;
use crate::graph::{
    ConfigValue, FlowInRef, FlowOutRef, Literal, NodeRef, Op, ValueInRef, ValueOutRef, ValueType,
    VariableId,
};

/// Ports of a list write that takes an index and a value.
#[derive(Debug, Clone)]
pub struct ListSetItem {
    pub index: ValueInRef,
    pub value: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

#[derive(Debug, Clone)]
pub struct ListAddItem {
    pub value: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

#[derive(Debug, Clone)]
pub struct ListRemoveItem {
    pub index: ValueInRef,
    pub flow_in: FlowInRef,
    pub flow_out: FlowOutRef,
}

/// A bounds check that runs `pass` only when its condition holds and always continues on
/// `flow_out` afterwards.
struct Guard {
    flow_in: FlowInRef,
    pass: FlowOutRef,
    flow_out: FlowOutRef,
}

fn guard(ctx: &mut ExportContext, condition: &ValueOutRef) -> Guard {
    let sequence = ctx.create_node(Op::FlowSequence);
    let branch = ctx.create_node(Op::FlowBranch);
    branch
        .value_in("condition")
        .connect_to_source(ctx, condition);
    sequence
        .flow_out("0")
        .connect_to_flow_destination(ctx, &branch.flow_in("in"));
    Guard {
        flow_in: sequence.flow_in("in"),
        pass: branch.flow_out("true"),
        flow_out: sequence.flow_out("1"),
    }
}

#[derive(Debug, Clone)]
pub struct VariableBasedList {
    name: String,
    value_type: ValueType,
    slots: Vec<VariableId>,
    count: VariableId,
    capacity: VariableId,
    current_index: VariableId,
    value_to_set: VariableId,
    cursor: VariableId,
    set_switch: Option<NodeRef>,
    slot_reads: Vec<ValueOutRef>,
    count_read: Option<ValueOutRef>,
}

impl VariableBasedList {
    /// Declares the backing variables of a new, empty list.
    pub fn new(ctx: &mut ExportContext, value_type: ValueType, capacity: usize) -> Self {
        let name = ctx.unique_name("VARLIST");
        let slots = (0..capacity)
            .map(|n| {
                ctx.add_variable_with_id_if_needed(
                    &format!("{}_{}", name, n),
                    Some(value_type.default_literal()),
                    value_type,
                )
            })
            .collect();
        let mut int_variable = |suffix: &str, initial: i32| {
            ctx.add_variable_with_id_if_needed(
                &format!("{}_{}", name, suffix),
                Some(Literal::Int(initial)),
                ValueType::Int,
            )
        };
        let count = int_variable("Count", 0);
        let capacity_var = int_variable("Capacity", capacity as i32);
        let current_index = int_variable("CurrentIndex", 0);
        let cursor = int_variable("Cursor", 0);
        let value_to_set = ctx.add_variable_with_id_if_needed(
            &format!("{}_ValueToSet", name),
            Some(value_type.default_literal()),
            value_type,
        );

        tracing::debug!(list = %name, capacity, value_type = %value_type, "declared variable-based list");

        Self {
            name,
            value_type,
            slots,
            count,
            capacity: capacity_var,
            current_index,
            value_to_set,
            cursor,
            set_switch: None,
            slot_reads: Vec::new(),
            count_read: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[VariableId] {
        &self.slots
    }

    // Compile-time operations. These edit initial values only and create no nodes.

    /// Number of items the list starts with.
    pub fn count(&self, ctx: &ExportContext) -> usize {
        ctx.graph()
            .variable(self.count)
            .and_then(|v| v.initial.as_ref())
            .and_then(Literal::as_int)
            .map(|n| n.max(0) as usize)
            .unwrap_or(0)
    }

    pub fn clear_list(&self, ctx: &mut ExportContext) {
        for &slot in &self.slots {
            ctx.set_variable_initial(slot, Some(self.value_type.default_literal()));
        }
        ctx.set_variable_initial(self.count, Some(Literal::Int(0)));
    }

    pub fn add_item(&self, ctx: &mut ExportContext, value: Literal) -> Result<(), ListError> {
        let count = self.count(ctx);
        let Some(&slot) = self.slots.get(count) else {
            return Err(ListError::ListFull {
                list: self.name.clone(),
                capacity: self.capacity(),
            });
        };
        ctx.set_variable_initial(slot, Some(value));
        ctx.set_variable_initial(self.count, Some(Literal::Int(count as i32 + 1)));
        Ok(())
    }

    pub fn set_item(
        &self,
        ctx: &mut ExportContext,
        index: usize,
        value: Literal,
    ) -> Result<(), ListError> {
        let slot = self.checked_slot(ctx, index)?;
        ctx.set_variable_initial(slot, Some(value));
        Ok(())
    }

    pub fn get_item(&self, ctx: &ExportContext, index: usize) -> Result<Literal, ListError> {
        let slot = self.checked_slot(ctx, index)?;
        Ok(ctx
            .graph()
            .variable(slot)
            .and_then(|v| v.initial.clone())
            .unwrap_or_else(|| self.value_type.default_literal()))
    }

    fn checked_slot(&self, ctx: &ExportContext, index: usize) -> Result<VariableId, ListError> {
        let count = self.count(ctx);
        let out_of_range = || ListError::IndexOutOfRange {
            list: self.name.clone(),
            index,
            count,
        };
        if index >= count {
            return Err(out_of_range());
        }
        self.slots.get(index).copied().ok_or_else(out_of_range)
    }

    // Graph operations.

    /// Live item count.
    pub fn count_value(&mut self, ctx: &mut ExportContext) -> ValueOutRef {
        if let Some(read) = &self.count_read {
            return read.clone();
        }
        let read = get_variable(ctx, self.count);
        self.count_read = Some(read.clone());
        read
    }

    fn slot_reads(&mut self, ctx: &mut ExportContext) -> Vec<ValueOutRef> {
        if self.slot_reads.is_empty() {
            self.slot_reads = self
                .slots
                .iter()
                .map(|&slot| get_variable(ctx, slot))
                .collect();
        }
        self.slot_reads.clone()
    }

    fn cases(&self) -> ConfigValue {
        ConfigValue::IntList((0..self.slots.len() as i32).collect())
    }

    /// Reads the item at `index` without a bounds check. Indices outside `0..capacity`
    /// yield the type's default value.
    pub fn get_item_value(&mut self, ctx: &mut ExportContext, index: &ValueOutRef) -> ValueOutRef {
        let reads = self.slot_reads(ctx);
        let switch = ctx.create_node(Op::MathSwitch);
        switch.set_config(ctx, "cases", self.cases());
        switch
            .value_in("selection")
            .connect_to_source(ctx, index);
        switch
            .value_in("default")
            .set_value(ctx, self.value_type.default_literal());
        for (n, read) in reads.iter().enumerate() {
            switch
                .value_in(&n.to_string())
                .connect_to_source(ctx, read);
        }
        switch.value_out("value")
    }

    /// `0 <= index < count`, returning the linked index input and the condition.
    fn in_range(&mut self, ctx: &mut ExportContext, inclusive_end: bool) -> (ValueInRef, ValueOutRef) {
        let count = self.count_value(ctx);
        let lower = ctx.create_node(Op::MathGe);
        lower.value_in("b").set_value(ctx, Literal::Int(0));
        let upper = ctx.create_node(if inclusive_end { Op::MathLe } else { Op::MathLt });
        upper.value_in("b").connect_to_source(ctx, &count);
        let both = binary(
            ctx,
            Op::MathAnd,
            &lower.value_out("value"),
            &upper.value_out("value"),
        );
        (ValueInRef::link([lower.value_in("a"), upper.value_in("a")]), both)
    }

    /// Reads the item at `index`, or the type's default when `index` is outside the live count.
    pub fn get_item_checked(&mut self, ctx: &mut ExportContext, index: &ValueOutRef) -> ValueOutRef {
        let value = self.get_item_value(ctx, index);
        let (range_index, in_range) = self.in_range(ctx, false);
        range_index.connect_to_source(ctx, index);
        let select = ctx.create_node(Op::MathSelect);
        select
            .value_in("condition")
            .connect_to_source(ctx, &in_range);
        select.value_in("a").connect_to_source(ctx, &value);
        select
            .value_in("b")
            .set_value(ctx, self.value_type.default_literal());
        select.value_out("value")
    }

    /// The shared write switch, created on first use. Case `n` writes the pending value
    /// into backing slot `n`.
    fn set_switch(&mut self, ctx: &mut ExportContext) -> NodeRef {
        if let Some(switch) = self.set_switch {
            return switch;
        }
        let switch = ctx.create_node(Op::FlowSwitch);
        switch.set_config(ctx, "cases", self.cases());
        let index = get_variable(ctx, self.current_index);
        switch
            .value_in("selection")
            .connect_to_source(ctx, &index);
        let pending = get_variable(ctx, self.value_to_set);
        for (n, &slot) in self.slots.iter().enumerate() {
            let write = set_variable_from(ctx, slot, &pending);
            switch
                .flow_out(&n.to_string())
                .connect_to_flow_destination(ctx, &write.flow_in);
        }
        self.set_switch = Some(switch);
        switch
    }

    /// Writes `value` at `index` through the shared switch, without a bounds check.
    pub fn set_item_flow(&mut self, ctx: &mut ExportContext) -> ListSetItem {
        let switch = self.set_switch(ctx);
        let sequence = ctx.create_node(Op::FlowSequence);
        let store_index = set_variable(ctx, self.current_index);
        let store_value = set_variable(ctx, self.value_to_set);
        sequence
            .flow_out("0")
            .connect_to_flow_destination(ctx, &store_index.flow_in);
        store_index
            .flow_out
            .connect_to_flow_destination(ctx, &store_value.flow_in);
        store_value
            .flow_out
            .connect_to_flow_destination(ctx, &switch.flow_in("in"));
        ListSetItem {
            index: store_index.value,
            value: store_value.value,
            flow_in: sequence.flow_in("in"),
            flow_out: sequence.flow_out("1"),
        }
    }

    /// Writes `value` at `index` only when `index` is inside the live count.
    pub fn set_item_checked(&mut self, ctx: &mut ExportContext) -> ListSetItem {
        let (range_index, in_range) = self.in_range(ctx, false);
        let check = guard(ctx, &in_range);
        let set = self.set_item_flow(ctx);
        check.pass.connect_to_flow_destination(ctx, &set.flow_in);
        ListSetItem {
            index: ValueInRef::link([range_index, set.index]),
            value: set.value,
            flow_in: check.flow_in,
            flow_out: check.flow_out,
        }
    }

    /// Appends `value` when there is room; a full list is left unchanged.
    pub fn add_item_flow(&mut self, ctx: &mut ExportContext) -> ListAddItem {
        let count = self.count_value(ctx);
        let capacity = get_variable(ctx, self.capacity);
        let has_room = binary(ctx, Op::MathLt, &count, &capacity);
        let check = guard(ctx, &has_room);

        let set = self.set_item_flow(ctx);
        set.index.connect_to_source(ctx, &count);
        check.pass.connect_to_flow_destination(ctx, &set.flow_in);

        let grown = binary_literal(ctx, Op::MathAdd, &count, Literal::Int(1));
        let grow = set_variable_from(ctx, self.count, &grown);
        set.flow_out.connect_to_flow_destination(ctx, &grow.flow_in);

        ListAddItem {
            value: set.value,
            flow_in: check.flow_in,
            flow_out: check.flow_out,
        }
    }

    /// Inserts `value` at `index` (`0 <= index <= count`) when there is room, shifting the
    /// tail up one slot from the end downwards.
    pub fn insert_item_flow(&mut self, ctx: &mut ExportContext) -> ListSetItem {
        let (insert_index, in_range) = self.in_range(ctx, true);
        let count = self.count_value(ctx);
        let capacity = get_variable(ctx, self.capacity);
        let has_room = binary(ctx, Op::MathLt, &count, &capacity);
        let allowed = binary(ctx, Op::MathAnd, &in_range, &has_room);
        let check = guard(ctx, &allowed);

        // cursor = count; while cursor > index { list[cursor] = list[cursor - 1]; cursor -= 1 }
        let start = set_variable_from(ctx, self.cursor, &count);
        check.pass.connect_to_flow_destination(ctx, &start.flow_in);

        let shift = stepped_while(ctx);
        start
            .flow_out
            .connect_to_flow_destination(ctx, &shift.flow_in);
        let cursor = get_variable(ctx, self.cursor);
        let above = ctx.create_node(Op::MathGt);
        above.value_in("a").connect_to_source(ctx, &cursor);
        shift
            .condition
            .connect_to_source(ctx, &above.value_out("value"));

        let below_cursor = binary_literal(ctx, Op::MathSub, &cursor, Literal::Int(1));
        let moved = self.get_item_value(ctx, &below_cursor);
        let shift_set = self.set_item_flow(ctx);
        shift_set.index.connect_to_source(ctx, &cursor);
        shift_set.value.connect_to_source(ctx, &moved);
        shift
            .body
            .connect_to_flow_destination(ctx, &shift_set.flow_in);
        let step = set_variable_from(ctx, self.cursor, &below_cursor);
        shift
            .step
            .connect_to_flow_destination(ctx, &step.flow_in);

        let place = self.set_item_flow(ctx);
        shift
            .completed
            .connect_to_flow_destination(ctx, &place.flow_in);
        let grown = binary_literal(ctx, Op::MathAdd, &count, Literal::Int(1));
        let grow = set_variable_from(ctx, self.count, &grown);
        place
            .flow_out
            .connect_to_flow_destination(ctx, &grow.flow_in);

        ListSetItem {
            index: ValueInRef::link([insert_index, above.value_in("b"), place.index]),
            value: place.value,
            flow_in: check.flow_in,
            flow_out: check.flow_out,
        }
    }

    /// Removes the item at `index` when it is inside the live count, shifting the tail down.
    pub fn remove_item_flow(&mut self, ctx: &mut ExportContext) -> ListRemoveItem {
        let (range_index, in_range) = self.in_range(ctx, false);
        let check = guard(ctx, &in_range);
        let count = self.count_value(ctx);

        // for i in index..count - 1 { list[i] = list[i + 1] }
        let shift = for_loop(ctx, 0);
        check
            .pass
            .connect_to_flow_destination(ctx, &shift.flow_in);
        let last = binary_literal(ctx, Op::MathSub, &count, Literal::Int(1));
        shift.end.connect_to_source(ctx, &last);

        let next = binary_literal(ctx, Op::MathAdd, &shift.index, Literal::Int(1));
        let moved = self.get_item_value(ctx, &next);
        let set = self.set_item_flow(ctx);
        set.index.connect_to_source(ctx, &shift.index);
        set.value.connect_to_source(ctx, &moved);
        shift
            .loop_body
            .connect_to_flow_destination(ctx, &set.flow_in);

        let shrink = set_variable_from(ctx, self.count, &last);
        shift
            .completed
            .connect_to_flow_destination(ctx, &shrink.flow_in);

        ListRemoveItem {
            index: ValueInRef::link([range_index, shift.start]),
            flow_in: check.flow_in,
            flow_out: check.flow_out,
        }
    }

    /// Sets the live count to zero. Backing slots keep their stale values.
    pub fn clear_flow(&mut self, ctx: &mut ExportContext) -> (FlowInRef, FlowOutRef) {
        let reset = set_variable(ctx, self.count);
        reset.value.set_value(ctx, Literal::Int(0));
        (reset.flow_in, reset.flow_out)
    }
}
