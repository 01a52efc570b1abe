//! Common test utilities for building reflected classes and inspecting compiled graphs.
use kumiki::lower::{
    Expression, ExpressionKind, FieldInfo, LiteralValue, MemberRef, MethodInfo, MethodRef,
    ParameterInfo, Statement, StatementKind, TypeRef,
};
use kumiki::prelude::*;

#[allow(dead_code)]
pub fn ty(name: &str) -> TypeRef {
    TypeRef::new(name)
}

#[allow(dead_code)]
pub fn list_ty(element: &str) -> TypeRef {
    TypeRef {
        generic_arguments: vec![TypeRef::new(element)],
        ..TypeRef::new("List")
    }
}

fn expression(kind: ExpressionKind) -> Expression {
    Expression {
        kind,
        name: None,
        result_type: None,
        method: None,
        member: None,
        literal: None,
        operator: None,
        children: Vec::new(),
    }
}

fn typed(mut expr: Expression, type_name: &str) -> Expression {
    expr.result_type = Some(ty(type_name));
    expr
}

// Expressions

#[allow(dead_code)]
pub fn int(value: i64) -> Expression {
    Expression {
        literal: Some(LiteralValue::Int(value)),
        ..typed(expression(ExpressionKind::Literal), "int")
    }
}

#[allow(dead_code)]
pub fn float(value: f64) -> Expression {
    Expression {
        literal: Some(LiteralValue::Float(value)),
        ..typed(expression(ExpressionKind::Literal), "float")
    }
}

#[allow(dead_code)]
pub fn boolean(value: bool) -> Expression {
    Expression {
        literal: Some(LiteralValue::Bool(value)),
        ..typed(expression(ExpressionKind::Literal), "bool")
    }
}

#[allow(dead_code)]
pub fn text(value: &str) -> Expression {
    Expression {
        literal: Some(LiteralValue::Text(value.to_string())),
        ..typed(expression(ExpressionKind::Literal), "string")
    }
}

/// A name typed as `type_name`.
#[allow(dead_code)]
pub fn ident(name: &str, type_name: &str) -> Expression {
    Expression {
        name: Some(name.to_string()),
        ..typed(expression(ExpressionKind::Identifier), type_name)
    }
}

/// The name of a type, as the receiver of a static call.
#[allow(dead_code)]
pub fn type_name(name: &str) -> Expression {
    Expression {
        name: Some(name.to_string()),
        ..expression(ExpressionKind::Identifier)
    }
}

#[allow(dead_code)]
pub fn this() -> Expression {
    expression(ExpressionKind::This)
}

/// `receiver.name`, declared on `declaring` and typed as `member_type`.
#[allow(dead_code)]
pub fn member(receiver: Option<Expression>, declaring: &str, name: &str, member_type: &str) -> Expression {
    Expression {
        member: Some(MemberRef {
            name: name.to_string(),
            declaring_type: ty(declaring),
            member_type: Some(ty(member_type)),
        }),
        children: receiver.into_iter().collect(),
        ..typed(expression(ExpressionKind::MemberAccess), member_type)
    }
}

/// `transform`, the component's own transform.
#[allow(dead_code)]
pub fn own_transform() -> Expression {
    member(None, "Component", "transform", "Transform")
}

/// `receiver.name(args)`. Static calls pass [`type_name`] as the receiver.
#[allow(dead_code)]
pub fn call(
    receiver: Expression,
    declaring: &str,
    name: &str,
    args: Vec<Expression>,
    return_type: Option<&str>,
) -> Expression {
    let mut children = vec![receiver];
    children.extend(args);
    Expression {
        method: Some(MethodRef {
            name: name.to_string(),
            declaring_type: ty(declaring),
            is_static: false,
            return_type: return_type.map(ty),
        }),
        result_type: return_type.map(ty),
        children,
        ..expression(ExpressionKind::MethodInvocation)
    }
}

#[allow(dead_code)]
pub fn binary(operator: &str, lhs: Expression, rhs: Expression, result: &str) -> Expression {
    Expression {
        operator: Some(operator.to_string()),
        children: vec![lhs, rhs],
        ..typed(expression(ExpressionKind::Binary), result)
    }
}

#[allow(dead_code)]
pub fn assign(target: Expression, operator: &str, value: Expression) -> Expression {
    Expression {
        operator: Some(operator.to_string()),
        result_type: target.result_type.clone(),
        children: vec![target, value],
        ..expression(ExpressionKind::Assignment)
    }
}

#[allow(dead_code)]
pub fn negate(operand: Expression) -> Expression {
    Expression {
        operator: Some("-".to_string()),
        result_type: operand.result_type.clone(),
        children: vec![operand],
        ..expression(ExpressionKind::PrefixUnary)
    }
}

#[allow(dead_code)]
pub fn postfix(target: Expression, operator: &str) -> Expression {
    Expression {
        operator: Some(operator.to_string()),
        result_type: target.result_type.clone(),
        children: vec![target],
        ..expression(ExpressionKind::PostfixUnary)
    }
}

#[allow(dead_code)]
pub fn new_obj(type_name: &str, args: Vec<Expression>) -> Expression {
    Expression {
        children: args,
        ..typed(expression(ExpressionKind::ObjectCreation), type_name)
    }
}

#[allow(dead_code)]
pub fn element(collection: Expression, index: Expression, result: &str) -> Expression {
    Expression {
        children: vec![collection, index],
        ..typed(expression(ExpressionKind::ElementAccess), result)
    }
}

#[allow(dead_code)]
pub fn await_(inner: Expression) -> Expression {
    Expression {
        children: vec![inner],
        ..expression(ExpressionKind::Await)
    }
}

// Statements

fn statement(kind: StatementKind, children: Vec<Statement>, expressions: Vec<Expression>) -> Statement {
    Statement {
        kind,
        children,
        expressions,
    }
}

#[allow(dead_code)]
pub fn expr_stmt(expr: Expression) -> Statement {
    statement(StatementKind::Expression, Vec::new(), vec![expr])
}

/// `target op value;`
#[allow(dead_code)]
pub fn assign_stmt(target: Expression, operator: &str, value: Expression) -> Statement {
    expr_stmt(assign(target, operator, value))
}

/// `type_name name = init;`
#[allow(dead_code)]
pub fn declare(name: &str, type_name: &str, init: Option<Expression>) -> Statement {
    let initializer = init
        .map(|e| statement(StatementKind::Initializer, Vec::new(), vec![e]))
        .into_iter()
        .collect();
    let declarator = statement(
        StatementKind::VariableDeclarator,
        initializer,
        vec![ident(name, type_name)],
    );
    statement(StatementKind::Declaration, vec![declarator], Vec::new())
}

#[allow(dead_code)]
pub fn if_stmt(condition: Expression, then: Vec<Statement>, otherwise: Option<Vec<Statement>>) -> Statement {
    let mut children = vec![
        statement(StatementKind::Condition, Vec::new(), vec![condition]),
        statement(StatementKind::ThenClause, then, Vec::new()),
    ];
    if let Some(otherwise) = otherwise {
        children.push(statement(StatementKind::ElseClause, otherwise, Vec::new()));
    }
    statement(StatementKind::If, children, Vec::new())
}

/// `for (init; condition; incrementor) { body }`. `init` is a [`declare`] or an [`expr_stmt`].
#[allow(dead_code)]
pub fn for_stmt(init: Statement, condition: Expression, incrementor: Expression, body: Vec<Statement>) -> Statement {
    let initializer = match init.kind {
        StatementKind::Declaration => statement(StatementKind::ForInitializer, vec![init], Vec::new()),
        _ => statement(StatementKind::ForInitializer, Vec::new(), init.expressions),
    };
    let mut children = vec![
        initializer,
        statement(StatementKind::ForCondition, Vec::new(), vec![condition]),
        statement(StatementKind::ForIncrementor, Vec::new(), vec![incrementor]),
    ];
    children.extend(body);
    statement(StatementKind::For, children, Vec::new())
}

#[allow(dead_code)]
pub fn ret(value: Option<Expression>) -> Statement {
    statement(StatementKind::Return, Vec::new(), value.into_iter().collect())
}

// Declarations

#[allow(dead_code)]
pub fn method(name: &str, body: Vec<Statement>) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        body,
        ..MethodInfo::default()
    }
}

/// A method with typed parameters and an optional return type.
#[allow(dead_code)]
pub fn method_with(
    name: &str,
    parameters: &[(&str, &str)],
    return_type: Option<&str>,
    body: Vec<Statement>,
) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        parameters: parameters
            .iter()
            .map(|(name, type_name)| ParameterInfo {
                name: name.to_string(),
                param_type: ty(type_name),
            })
            .collect(),
        return_type: return_type.map(ty),
        body,
        ..MethodInfo::default()
    }
}

#[allow(dead_code)]
pub fn field(name: &str, field_type: TypeRef, initializer: Option<Expression>) -> FieldInfo {
    FieldInfo {
        name: name.to_string(),
        field_type,
        initializer,
        capacity: None,
    }
}

#[allow(dead_code)]
pub fn class(name: &str, fields: Vec<FieldInfo>, methods: Vec<MethodInfo>) -> ClassInfo {
    ClassInfo {
        name: name.to_string(),
        fields,
        methods,
    }
}

/// `int counter = 0; void Start() { counter = counter + 1; }`
#[allow(dead_code)]
pub fn create_counter_class() -> ClassInfo {
    let counter = || ident("counter", "int");
    class(
        "Counter",
        vec![field("counter", ty("int"), Some(int(0)))],
        vec![method(
            "Start",
            vec![assign_stmt(counter(), "=", binary("+", counter(), int(1), "int"))],
        )],
    )
}

/// Compiles `class` with the compiled object resolved to target 0.
#[allow(dead_code)]
pub fn compile(class: ClassInfo) -> CompilationArtifacts {
    Compiler::builder(class)
        .with_resolver(StaticResolver::new().with_self(0))
        .build()
        .compile()
        .expect("Failed to compile")
}

// Graph inspection

/// The single node of kind `op`.
#[allow(dead_code)]
pub fn only(graph: &Graph, op: Op) -> &Node {
    let mut nodes = graph.nodes_with_op(op);
    let node = nodes
        .next()
        .unwrap_or_else(|| panic!("no {} node in the graph", op));
    assert!(nodes.next().is_none(), "more than one {} node", op);
    node
}

/// Nodes whose flow output `socket` targets `node`.
#[allow(dead_code)]
pub fn flow_predecessors<'g>(graph: &'g Graph, node: NodeId, socket: &str) -> Vec<&'g Node> {
    graph
        .nodes
        .iter()
        .filter(|n| {
            n.flows_out
                .values()
                .any(|out| out.targets.iter().any(|t| t.node == node && t.socket == socket))
        })
        .collect()
}

/// Nodes of kind `variable/set` writing the variable called `name`.
#[allow(dead_code)]
pub fn writes_to<'g>(graph: &'g Graph, name: &str) -> Vec<&'g Node> {
    let (id, _) = graph
        .variable_by_name(name)
        .unwrap_or_else(|| panic!("variable {} not declared", name));
    graph
        .nodes_with_op(Op::VariableSet)
        .filter(|n| n.config("variable").and_then(ConfigValue::as_int) == Some(id as i32))
        .collect()
}
