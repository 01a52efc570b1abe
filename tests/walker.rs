//! Tests for lowering statements, loops and calls into the node graph.
mod common;
use common::*;
use kumiki::lower::{Expression, MethodInfo, Statement, StatementKind};
use kumiki::prelude::*;

fn flag() -> Expression {
    ident("flag", "bool")
}

fn x() -> Expression {
    ident("x", "int")
}

fn total() -> Expression {
    ident("total", "int")
}

fn i() -> Expression {
    ident("i", "int")
}

/// A class with `bool flag`, `int x` and `int total` fields and the given methods.
fn widget_class(methods: Vec<MethodInfo>) -> ClassInfo {
    class(
        "Widget",
        vec![
            field("flag", ty("bool"), Some(boolean(false))),
            field("x", ty("int"), None),
            field("total", ty("int"), None),
        ],
        methods,
    )
}

fn start_class(body: Vec<Statement>) -> ClassInfo {
    widget_class(vec![method("Start", body)])
}

fn literal_of(node: &Node, socket: &str) -> Option<Literal> {
    node.value_in(socket).and_then(|i| i.literal.clone())
}

// Entry points

#[test]
fn test_start_entry_point_lowers_cleanly() {
    let artifacts = compile(create_counter_class());
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let start = only(graph, Op::EventOnStart);
    let set = graph.flow_successor(start.index, "out").expect("body wired");
    assert_eq!(set.op, Op::VariableSet);
    let add = graph.value_source(set.index, "value").expect("value wired");
    assert_eq!(add.op, Op::MathAdd);
    assert_eq!(literal_of(add, "b"), Some(Literal::Int(1)));
    let (_, counter) = graph.variable_by_name("counter").expect("field declared");
    assert_eq!(counter.initial, Some(Literal::Int(0)));
}

#[test]
fn test_update_and_time_reads_share_tick() {
    let elapsed = || ident("elapsed", "float");
    let delta = member(Some(type_name("Time")), "Time", "deltaTime", "float");
    let class = class(
        "Clock",
        vec![field("elapsed", ty("float"), None)],
        vec![method(
            "Update",
            vec![assign_stmt(elapsed(), "=", binary("+", elapsed(), delta, "float"))],
        )],
    );

    let artifacts = compile(class);
    let graph = &artifacts.graph;
    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let tick = only(graph, Op::EventOnTick);
    let fan = graph.flow_successor(tick.index, "out").expect("tick wired");
    assert_eq!(fan.op, Op::FlowSequence);
    assert_eq!(
        graph.flow_successor(fan.index, "0").map(|n| n.op),
        Some(Op::VariableSet)
    );
    let add = only(graph, Op::MathAdd);
    assert_eq!(graph.value_source(add.index, "b").map(|n| n.index), Some(tick.index));
}

#[test]
fn test_custom_entry_point_receives_event_values() {
    let health = || ident("health", "int");
    let class = class(
        "Target",
        vec![field("health", ty("int"), Some(int(100)))],
        vec![method_with(
            "OnHit",
            &[("damage", "int")],
            None,
            vec![assign_stmt(health(), "-=", ident("damage", "int"))],
        )],
    );

    let artifacts = Compiler::builder(class)
        .with_entry_point("OnHit")
        .build()
        .compile()
        .expect("Failed to compile");
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    assert_eq!(graph.events.len(), 1);
    assert_eq!(graph.events[0].name, "OnHit");
    assert_eq!(graph.events[0].values[0].name, "damage");
    assert_eq!(graph.events[0].values[0].value_type, ValueType::Int);
    let receive = only(graph, Op::EventReceive);
    assert_eq!(receive.config("event"), Some(&ConfigValue::Int(0)));
    let sub = only(graph, Op::MathSub);
    assert_eq!(graph.value_source(sub.index, "b").map(|n| n.index), Some(receive.index));
}

fn compile_on_hit(body: Vec<Statement>, parameters: &[(&str, &str)]) -> CompilationArtifacts {
    let class = class(
        "Target",
        Vec::new(),
        vec![method_with("OnHit", parameters, None, body)],
    );
    Compiler::builder(class)
        .with_entry_point("OnHit")
        .build()
        .compile()
        .expect("Failed to compile")
}

fn log_of(value: Expression) -> Statement {
    expr_stmt(call(type_name("Debug"), "Debug", "Log", vec![value], None))
}

#[test]
fn test_written_parameter_accumulates_across_iterations() {
    let body = vec![
        for_stmt(
            declare("i", "int", Some(int(0))),
            binary("<", i(), int(3), "bool"),
            postfix(i(), "++"),
            vec![assign_stmt(x(), "=", binary("+", x(), int(1), "int"))],
        ),
        log_of(x()),
    ];
    let artifacts = compile_on_hit(body, &[("x", "int")]);
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    let receive = only(graph, Op::EventReceive);
    let (local, _) = graph.variable_by_name("OnHit_x").expect("parameter copied");
    // The copy is seeded from the event value before anything else runs.
    let seed = graph.flow_successor(receive.index, "out").expect("body wired");
    assert_eq!(seed.op, Op::VariableSet);
    assert_eq!(seed.config("variable"), Some(&ConfigValue::Int(local as i32)));
    assert_eq!(graph.value_source(seed.index, "value").map(|n| n.index), Some(receive.index));
    assert_eq!(writes_to(graph, "OnHit_x").len(), 2);

    // Each iteration adds to the local, not to the event value.
    let add = only(graph, Op::MathAdd);
    let read = graph.value_source(add.index, "a").expect("operand wired");
    assert_eq!(read.op, Op::VariableGet);
    assert_eq!(read.config("variable"), Some(&ConfigValue::Int(local as i32)));
    let log = only(graph, Op::DebugLog);
    assert_eq!(graph.value_source(log.index, "0").map(|n| n.op), Some(Op::VariableGet));
}

#[test]
fn test_parameter_written_on_one_arm_keeps_its_value_on_the_other() {
    let condition = || ident("c", "bool");
    let body = vec![
        if_stmt(condition(), vec![assign_stmt(x(), "=", int(5))], None),
        log_of(x()),
    ];
    let artifacts = compile_on_hit(body, &[("x", "int"), ("c", "bool")]);
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    let receive = only(graph, Op::EventReceive);
    let seed = graph.flow_successor(receive.index, "out").expect("body wired");
    assert_eq!(graph.value_source(seed.index, "value").map(|n| n.index), Some(receive.index));
    let branch = only(graph, Op::FlowBranch);
    assert_eq!(graph.flow_successor(seed.index, "out").map(|n| n.index), Some(branch.index));
    // A parameter that is only read stays bound to the event value.
    assert!(graph.variable_by_name("OnHit_c").is_none());
    assert_eq!(graph.value_source(branch.index, "condition").map(|n| n.index), Some(receive.index));

    let log = only(graph, Op::DebugLog);
    let read = graph.value_source(log.index, "0").expect("slot wired");
    let (local, _) = graph.variable_by_name("OnHit_x").expect("parameter copied");
    assert_eq!(read.config("variable"), Some(&ConfigValue::Int(local as i32)));
}

// Branches

#[test]
fn test_if_else_arms_join_through_sequence() {
    let body = vec![
        if_stmt(
            flag(),
            vec![assign_stmt(x(), "=", int(1))],
            Some(vec![assign_stmt(x(), "=", int(2))]),
        ),
        assign_stmt(x(), "=", int(3)),
    ];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    only(graph, Op::FlowBranch);
    let join = only(graph, Op::FlowSequence);
    let arms = flow_predecessors(graph, join.index, "in");
    assert_eq!(arms.len(), 2);
    assert!(arms.iter().all(|n| n.op == Op::VariableSet));
    let after = graph.flow_successor(join.index, "0").expect("continuation wired");
    assert_eq!(literal_of(after, "value"), Some(Literal::Int(3)));
}

#[test]
fn test_if_without_else_joins_false_arm() {
    let body = vec![
        if_stmt(flag(), vec![assign_stmt(x(), "=", int(1))], None),
        assign_stmt(x(), "=", int(3)),
    ];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    let branch = only(graph, Op::FlowBranch);
    let join = only(graph, Op::FlowSequence);
    let arms = flow_predecessors(graph, join.index, "in");
    assert_eq!(arms.len(), 2);
    assert!(arms.iter().any(|n| n.index == branch.index));
}

#[test]
fn test_returned_arm_does_not_rejoin() {
    let body = vec![
        if_stmt(flag(), vec![ret(None)], None),
        assign_stmt(x(), "=", int(3)),
    ];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let branch = only(graph, Op::FlowBranch);
    assert_eq!(graph.count_op(Op::FlowSequence), 0);
    assert!(graph.flow_successor(branch.index, "true").is_none());
    assert_eq!(
        graph.flow_successor(branch.index, "false").map(|n| n.op),
        Some(Op::VariableSet)
    );
}

#[test]
fn test_statements_after_every_arm_returned_are_reported() {
    let body = vec![
        if_stmt(flag(), vec![ret(None)], Some(vec![ret(None)])),
        assign_stmt(x(), "=", int(3)),
    ];
    let artifacts = compile(start_class(body));

    assert_eq!(artifacts.graph.count_op(Op::VariableSet), 0);
    assert_eq!(artifacts.diagnostics.len(), 1);
    assert_eq!(artifacts.diagnostics[0].kind, DiagnosticKind::Unsupported);
    assert_eq!(artifacts.diagnostics[0].method, "Start");
}

#[test]
fn test_process_if_statement_never_rejoins() {
    let arms: Vec<(Vec<Statement>, Option<Vec<Statement>>)> = vec![
        (Vec::new(), None),
        (Vec::new(), Some(Vec::new())),
        (vec![ret(None)], Some(Vec::new())),
        (vec![ret(None)], Some(vec![ret(None)])),
    ];
    let widget = class("Widget", Vec::new(), Vec::new());

    for (then, otherwise) in arms {
        let stmt = if_stmt(boolean(true), then, otherwise);
        let mut ctx = ExportContext::new(CompilerOptions::default());
        let start = ctx.create_node(Op::EventOnStart).flow_out("out");
        let mut walker = Walker::new(&mut ctx, &widget);
        assert!(walker.process_if_statement(&stmt, start).is_none());
        assert_eq!(ctx.graph().count_op(Op::FlowBranch), 1);
    }
}

#[test]
fn test_process_statement_returns_continuation() {
    let widget = class("Widget", Vec::new(), Vec::new());
    let stmt = expr_stmt(call(
        type_name("Debug"),
        "Debug",
        "Log",
        vec![text("hello")],
        None,
    ));
    let mut ctx = ExportContext::new(CompilerOptions::default());
    let start = ctx.create_node(Op::EventOnStart).flow_out("out");

    let mut walker = Walker::new(&mut ctx, &widget);
    let next = walker.process_statement(&stmt, start).expect("statement continues");
    let log = only(ctx.graph(), Op::DebugLog);
    assert_eq!(next.node(), log.index);
    assert_eq!(next.socket(), "out");
}

// Loops

#[test]
fn test_canonical_for_becomes_one_native_loop() {
    let body = vec![for_stmt(
        declare("i", "int", Some(int(0))),
        binary("<", i(), int(5), "bool"),
        postfix(i(), "++"),
        vec![assign_stmt(total(), "+=", i())],
    )];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let native = only(graph, Op::FlowFor);
    assert_eq!(graph.count_op(Op::FlowBranch), 0);
    assert_eq!(native.config("initialIndex"), Some(&ConfigValue::Int(0)));
    assert_eq!(literal_of(native, "startIndex"), Some(Literal::Int(0)));
    assert_eq!(literal_of(native, "endIndex"), Some(Literal::Int(5)));
    // The body reads the native index directly.
    let add = only(graph, Op::MathAdd);
    assert_eq!(graph.value_source(add.index, "b").map(|n| n.index), Some(native.index));
    assert!(graph.variable_by_name("Start_i").is_none());
}

#[test]
fn test_strided_for_uses_counter_variable_and_back_edge() {
    let body = vec![for_stmt(
        declare("i", "int", Some(int(10))),
        binary(">", i(), int(0), "bool"),
        assign(i(), "-=", int(2)),
        vec![assign_stmt(total(), "+=", i())],
    )];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    assert_eq!(graph.count_op(Op::FlowFor), 0);
    let branch = only(graph, Op::FlowBranch);
    let counter_writes = writes_to(graph, "ForLoopIndex_0");
    assert_eq!(counter_writes.len(), 2);
    assert_eq!(flow_predecessors(graph, branch.index, "in").len(), 2);

    let step = graph
        .nodes_with_op(Op::MathAdd)
        .find(|n| literal_of(n, "b") == Some(Literal::Int(-2)));
    assert!(step.is_some());

    // The body falls through into the advance, which loops back to the branch.
    let body_write = writes_to(graph, "total")[0];
    let advance = graph
        .flow_successor(body_write.index, "out")
        .expect("body tail wired");
    assert!(counter_writes.iter().any(|n| n.index == advance.index));
    assert_eq!(
        graph.flow_successor(advance.index, "out").map(|n| n.index),
        Some(branch.index)
    );
}

#[test]
fn test_for_writing_its_bound_uses_custom_loop() {
    let limit = || ident("limit", "int");
    let class = class(
        "Widget",
        vec![field("limit", ty("int"), Some(int(4)))],
        vec![method(
            "Start",
            vec![for_stmt(
                declare("i", "int", Some(int(0))),
                binary("<", i(), limit(), "bool"),
                postfix(i(), "++"),
                vec![assign_stmt(limit(), "-=", int(1))],
            )],
        )],
    );
    let artifacts = compile(class);

    assert_eq!(artifacts.graph.count_op(Op::FlowFor), 0);
    assert_eq!(artifacts.graph.count_op(Op::FlowBranch), 1);
}

#[test]
fn test_for_over_existing_counter_syncs_final_value() {
    let class = class(
        "Widget",
        vec![field("i", ty("int"), None)],
        vec![method(
            "Start",
            vec![for_stmt(
                expr_stmt(assign(i(), "=", int(0))),
                binary("<", i(), int(3), "bool"),
                postfix(i(), "++"),
                Vec::new(),
            )],
        )],
    );
    let artifacts = compile(class);
    let graph = &artifacts.graph;

    assert_eq!(graph.count_op(Op::FlowFor), 0);
    let branch = only(graph, Op::FlowBranch);
    let sync = writes_to(graph, "i");
    assert_eq!(sync.len(), 1);
    assert_eq!(
        graph.flow_successor(branch.index, "false").map(|n| n.index),
        Some(sync[0].index)
    );
}

#[test]
fn test_unrecognized_for_is_reported_and_skipped() {
    let body = vec![
        for_stmt(
            declare("i", "int", Some(int(0))),
            binary("!=", i(), int(3), "bool"),
            postfix(i(), "++"),
            Vec::new(),
        ),
        assign_stmt(x(), "=", int(1)),
    ];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert_eq!(graph.count_op(Op::FlowFor), 0);
    assert_eq!(graph.count_op(Op::FlowBranch), 0);
    assert_eq!(artifacts.diagnostics.len(), 1);
    assert_eq!(artifacts.diagnostics[0].kind, DiagnosticKind::Unsupported);
    // Lowering continues with the next statement.
    assert_eq!(graph.count_op(Op::VariableSet), 1);
}

// Calls

#[test]
fn test_log_message_becomes_template() {
    let message = binary("+", text("Count: "), ident("total", "int"), "string");
    let body = vec![expr_stmt(call(
        type_name("Debug"),
        "Debug",
        "LogWarning",
        vec![message],
        None,
    ))];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let log = only(graph, Op::DebugLog);
    assert_eq!(
        log.config("message").and_then(ConfigValue::as_text),
        Some("Count: {0}")
    );
    assert_eq!(log.config("severity"), Some(&ConfigValue::Int(1)));
    assert_eq!(
        graph.value_source(log.index, "0").map(|n| n.op),
        Some(Op::VariableGet)
    );
}

#[test]
fn test_log_text_braces_do_not_become_slots() {
    let message = binary("+", text("set {b} to "), x(), "string");
    let body = vec![log_of(message)];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    let log = only(graph, Op::DebugLog);
    assert_eq!(
        log.config("message").and_then(ConfigValue::as_text),
        Some("set b to {0}")
    );
    assert!(log.value_in("b").is_none());
}

#[test]
fn test_delay_sequences_following_statements() {
    let delay = call(type_name("Task"), "Task", "Delay", vec![int(500)], Some("Task"));
    let body = vec![expr_stmt(await_(delay)), assign_stmt(x(), "=", int(1))];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let delay = only(graph, Op::FlowSetDelay);
    assert_eq!(
        graph.flow_successor(delay.index, "done").map(|n| n.op),
        Some(Op::VariableSet)
    );
    assert!(graph.flow_successor(delay.index, "out").is_none());
    assert_eq!(graph.count_op(Op::TypeIntToFloat), 1);
}

#[test]
fn test_await_wait_until_polls_on_tick() {
    let wait = new_obj("WaitUntil", vec![flag()]);
    let body = vec![expr_stmt(await_(wait)), assign_stmt(x(), "=", int(1))];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    only(graph, Op::EventOnTick);
    let pending = writes_to(graph, "WaitPending_0");
    assert_eq!(pending.len(), 2);
    let after = writes_to(graph, "x")[0];
    let resumed_by = flow_predecessors(graph, after.index, "in");
    assert_eq!(resumed_by.len(), 1);
    assert!(pending.iter().any(|n| n.index == resumed_by[0].index));
}

#[test]
fn test_wait_in_update_gets_its_own_tick_port() {
    let wait = new_obj("WaitUntil", vec![flag()]);
    let artifacts = compile(widget_class(vec![method(
        "Update",
        vec![expr_stmt(await_(wait)), assign_stmt(x(), "=", int(1))],
    )]));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    let tick = only(graph, Op::EventOnTick);
    let fan = graph.flow_successor(tick.index, "out").expect("tick wired");
    assert_eq!(fan.op, Op::FlowSequence);
    // Port 0 runs the Update body, which starts by arming the wait.
    let body = graph.flow_successor(fan.index, "0").expect("body wired");
    assert!(writes_to(graph, "WaitPending_0").iter().any(|n| n.index == body.index));
    // Port 1 re-checks the pending wait.
    assert_eq!(
        graph.flow_successor(fan.index, "1").map(|n| n.op),
        Some(Op::FlowBranch)
    );
}

#[test]
fn test_wait_in_method_inlined_from_update_keeps_single_tick_targets() {
    let wait = new_obj("WaitUntil", vec![flag()]);
    let artifacts = compile(widget_class(vec![
        method(
            "Update",
            vec![expr_stmt(call(this(), "Widget", "Poll", Vec::new(), None))],
        ),
        method("Poll", vec![expr_stmt(await_(wait)), assign_stmt(x(), "=", int(1))]),
    ]));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    assert_eq!(graph.count_op(Op::EventOnTick), 1);
    assert_eq!(artifacts.validation.count(FindingKind::FlowFanOut), 0);
    let tick = only(graph, Op::EventOnTick);
    let fan = graph.flow_successor(tick.index, "out").expect("tick wired");
    assert_eq!(fan.flows_out.len(), 2);
}

#[test]
fn test_same_unit_call_is_inlined_with_wait_all() {
    let class = class(
        "Spawner",
        vec![field("x", ty("int"), None)],
        vec![
            method(
                "Start",
                vec![
                    expr_stmt(call(this(), "Spawner", "Reset", Vec::new(), None)),
                    assign_stmt(x(), "=", int(5)),
                ],
            ),
            method("Reset", vec![assign_stmt(x(), "=", int(0))]),
        ],
    );
    let artifacts = compile(class);
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let sequence = only(graph, Op::FlowSequence);
    let body = graph.flow_successor(sequence.index, "0").expect("body wired");
    assert_eq!(literal_of(body, "value"), Some(Literal::Int(0)));

    let join = only(graph, Op::FlowWaitAll);
    assert_eq!(join.config("inputFlows"), Some(&ConfigValue::Int(2)));
    assert!(join.flows_in.contains("0"));
    assert!(join.flows_in.contains("1"));
    let after = graph.flow_successor(join.index, "out").expect("continuation wired");
    assert_eq!(literal_of(after, "value"), Some(Literal::Int(5)));
}

#[test]
fn test_inlined_arguments_are_passed_by_value() {
    let class = class(
        "Widget",
        vec![field("x", ty("int"), Some(int(7))), field("total", ty("int"), None)],
        vec![
            method(
                "Start",
                vec![expr_stmt(call(this(), "Widget", "Apply", vec![x()], None))],
            ),
            method_with(
                "Apply",
                &[("v", "int")],
                None,
                vec![
                    assign_stmt(x(), "=", int(0)),
                    assign_stmt(total(), "=", ident("v", "int")),
                ],
            ),
        ],
    );
    let artifacts = compile(class);
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    let (argument, _) = graph.variable_by_name("Apply_v").expect("argument copied");
    let copy = writes_to(graph, "Apply_v");
    assert_eq!(copy.len(), 1);
    // The copy runs first in the inlined body, before the callee overwrites `x`.
    let sequence = only(graph, Op::FlowSequence);
    assert_eq!(graph.flow_successor(sequence.index, "0").map(|n| n.index), Some(copy[0].index));
    assert_eq!(graph.flow_successor(copy[0].index, "out").map(|n| n.index), Some(writes_to(graph, "x")[0].index));

    let total = writes_to(graph, "total")[0];
    let read = graph.value_source(total.index, "value").expect("value wired");
    assert_eq!(read.config("variable"), Some(&ConfigValue::Int(argument as i32)));
}

#[test]
fn test_single_return_call_inlines_as_expression() {
    let twice = call(this(), "Widget", "Twice", vec![int(3)], Some("int"));
    let class = class(
        "Widget",
        vec![field("x", ty("int"), None)],
        vec![
            method("Start", vec![assign_stmt(x(), "=", twice)]),
            method_with(
                "Twice",
                &[("v", "int")],
                Some("int"),
                vec![ret(Some(binary("*", ident("v", "int"), int(2), "int")))],
            ),
        ],
    );
    let artifacts = compile(class);
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    assert_eq!(graph.count_op(Op::FlowSequence), 0);
    let mul = only(graph, Op::MathMul);
    assert_eq!(literal_of(mul, "a"), Some(Literal::Int(3)));
    assert_eq!(literal_of(mul, "b"), Some(Literal::Int(2)));
    let set = only(graph, Op::VariableSet);
    assert_eq!(graph.value_source(set.index, "value").map(|n| n.index), Some(mul.index));
}

#[test]
fn test_recursive_call_is_not_inlined() {
    let recurse = || expr_stmt(call(this(), "Widget", "Again", Vec::new(), None));
    let class = class(
        "Widget",
        Vec::new(),
        vec![method("Start", vec![recurse()]), method("Again", vec![recurse()])],
    );
    let artifacts = compile(class);

    assert_eq!(artifacts.graph.count_op(Op::FlowSequence), 1);
    assert_eq!(artifacts.diagnostics.len(), 1);
    assert_eq!(artifacts.diagnostics[0].kind, DiagnosticKind::Unsupported);
    assert_eq!(artifacts.diagnostics[0].method, "Again");
}

#[test]
fn test_unknown_call_is_unresolved() {
    let body = vec![expr_stmt(call(
        type_name("Physics"),
        "Physics",
        "SyncTransforms",
        Vec::new(),
        None,
    ))];
    let artifacts = compile(start_class(body));

    assert_eq!(artifacts.diagnostics.len(), 1);
    assert_eq!(artifacts.diagnostics[0].kind, DiagnosticKind::Unresolved);
}

#[test]
fn test_math_call_maps_to_one_node() {
    let speed = || ident("speed", "float");
    let sqrt = call(type_name("Mathf"), "Mathf", "Sqrt", vec![speed()], Some("float"));
    let class = class(
        "Widget",
        vec![field("speed", ty("float"), Some(float(4.0)))],
        vec![method("Start", vec![assign_stmt(speed(), "=", sqrt)])],
    );
    let artifacts = compile(class);

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    assert_eq!(artifacts.graph.count_op(Op::MathSqrt), 1);
}

// Host state

#[test]
fn test_local_position_assignment_writes_translation_pointer() {
    let target = member(Some(own_transform()), "Transform", "localPosition", "Vector3");
    let position = new_obj("Vector3", vec![int(1), int(2), int(3)]);
    let class = class(
        "Mover",
        Vec::new(),
        vec![method("Start", vec![assign_stmt(target, "=", position)])],
    );
    let artifacts = Compiler::builder(class)
        .with_resolver(StaticResolver::new().with_self(7))
        .with_space_conversion(false)
        .build()
        .compile()
        .expect("Failed to compile");
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    let set = only(graph, Op::PointerSet);
    assert_eq!(
        set.config("pointer").and_then(ConfigValue::as_text),
        Some("/nodes/{nodeIndex}/translation")
    );
    assert_eq!(literal_of(set, "nodeIndex"), Some(Literal::Int(7)));
    assert_eq!(literal_of(set, "value"), Some(Literal::Float3([1.0, 2.0, 3.0])));
}

#[test]
fn test_object_field_resolves_to_its_own_target() {
    let door = ident("door", "Transform");
    let target = member(Some(door), "Transform", "localPosition", "Vector3");
    let position = new_obj("Vector3", vec![int(0), int(4), int(0)]);
    let class = class(
        "Opener",
        vec![field("door", ty("Transform"), None)],
        vec![method("Start", vec![assign_stmt(target, "=", position)])],
    );
    let artifacts = Compiler::builder(class)
        .with_resolver(StaticResolver::new().with_self(7).with_object("door", 3))
        .with_space_conversion(false)
        .build()
        .compile()
        .expect("Failed to compile");

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    assert!(artifacts.graph.variable_by_name("door").is_none());
    let set = only(&artifacts.graph, Op::PointerSet);
    assert_eq!(literal_of(set, "nodeIndex"), Some(Literal::Int(3)));
}

#[test]
fn test_unresolved_target_is_reported_once() {
    let target = member(Some(own_transform()), "Transform", "localPosition", "Vector3");
    let position = new_obj("Vector3", vec![int(1), int(2), int(3)]);
    let class = class(
        "Mover",
        Vec::new(),
        vec![method("Start", vec![assign_stmt(target, "=", position)])],
    );
    let artifacts = Compiler::builder(class)
        .build()
        .compile()
        .expect("Failed to compile");

    assert_eq!(artifacts.diagnostics.len(), 1);
    assert_eq!(artifacts.diagnostics[0].kind, DiagnosticKind::Unresolved);
    assert_eq!(artifacts.validation.len(), 1);
    let finding = artifacts.validation.iter().next().expect("one finding");
    assert_eq!(finding.kind, FindingKind::DanglingInput);
    assert_eq!(finding.socket.as_deref(), Some("nodeIndex"));
}

#[test]
fn test_set_active_writes_two_pointers() {
    let game_object = member(None, "Component", "gameObject", "GameObject");
    let body = vec![expr_stmt(call(
        game_object,
        "GameObject",
        "SetActive",
        vec![boolean(false)],
        None,
    ))];
    let artifacts = compile(start_class(body));

    assert!(artifacts.is_clean(), "{}", artifacts.validation);
    assert_eq!(artifacts.graph.count_op(Op::PointerSet), 2);
}

#[test]
fn test_statement_kind_outside_parent_is_malformed() {
    let stray = Statement {
        kind: StatementKind::ThenClause,
        children: Vec::new(),
        expressions: Vec::new(),
    };
    let artifacts = compile(start_class(vec![stray]));

    assert_eq!(artifacts.diagnostics.len(), 1);
    assert_eq!(artifacts.diagnostics[0].kind, DiagnosticKind::Malformed);
}

#[test]
fn test_integer_literal_outside_i32_is_malformed() {
    let artifacts = compile(start_class(vec![assign_stmt(x(), "=", int(3_000_000_000))]));
    let graph = &artifacts.graph;

    assert!(
        artifacts
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Malformed && d.message.contains("3000000000"))
    );
    // Nothing is written with a wrapped value.
    assert!(writes_to(graph, "x").iter().all(|set| literal_of(set, "value").is_none()));
}

#[test]
fn test_most_negative_int_literal_survives_negation() {
    let body = vec![assign_stmt(x(), "=", negate(int(2_147_483_648)))];
    let artifacts = compile(start_class(body));
    let graph = &artifacts.graph;

    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    let set = writes_to(graph, "x")[0];
    assert_eq!(literal_of(set, "value"), Some(Literal::Int(i32::MIN)));
}
