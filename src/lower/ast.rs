//! The reflected syntax model consumed by the walker.
//!
//! Records arrive from an external producer as camelCase JSON. They carry the resolved types
//! and method/member symbols the walker needs, so no name lookup against source text happens
//! here.
//!
//! Child layout conventions:
//! - `methodInvocation`: `children[0]` is the receiver (an `identifier` naming the type for
//!   static calls), followed by the arguments in order.
//! - `memberAccess`: `children[0]` is the receiver; `member` names the accessed member.
//! - `binary`, `assignment`: `children[0]` and `children[1]` are the operands.
//! - `unary`, `postfixUnary`, `cast`, `await`, `parenthesized`: `children[0]` is the operand.
//! - `elementAccess`: `children[0]` is the collection, `children[1]` the index.
//! - `objectCreation`: `resultType` names the type, `children` are the constructor arguments.
//! - `if`: `condition`, `thenClause` and an optional `elseClause` statement children; the
//!   condition carries the expression, the clauses carry the arm statements.
//! - `for`: `forInitializer`, `forCondition`, `forIncrementor` children followed by the body.
//! - `declaration`: one `variableDeclarator` per name, carrying the name as an `identifier`
//!   expression and an optional `initializer` child holding the value.
//! - `expression`, `return`: the expression is `expressions[0]`.
//! - `assignment` statements carry one `assignment` expression.

use crate::error::AstLoadError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn from_json(json: &str) -> Result<Self, AstLoadError> {
        serde_json::from_str(json).map_err(|e| AstLoadError::JsonParseError(e.to_string()))
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    pub field_type: TypeRef,
    pub initializer: Option<Expression>,
    /// Declared capacity of a list or array field.
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: Option<TypeRef>,
    pub is_async: bool,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterInfo {
    pub name: String,
    pub param_type: TypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    Expression,
    Declaration,
    Assignment,
    If,
    Return,
    Block,
    For,
    VariableDeclarator,
    Initializer,
    Condition,
    ThenClause,
    ElseClause,
    ForInitializer,
    ForCondition,
    ForIncrementor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub kind: StatementKind,
    #[serde(default)]
    pub children: Vec<Statement>,
    #[serde(default)]
    pub expressions: Vec<Expression>,
}

impl Statement {
    pub fn child(&self, kind: StatementKind) -> Option<&Statement> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.expressions.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionKind {
    Literal,
    Identifier,
    This,
    MemberAccess,
    MethodInvocation,
    Binary,
    Unary,
    PostfixUnary,
    PrefixUnary,
    ObjectCreation,
    ElementAccess,
    Cast,
    Await,
    Assignment,
    Parenthesized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    pub kind: ExpressionKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub result_type: Option<TypeRef>,
    #[serde(default)]
    pub method: Option<MethodRef>,
    #[serde(default)]
    pub member: Option<MemberRef>,
    #[serde(default)]
    pub literal: Option<LiteralValue>,
    /// Operator token for binary, unary and assignment expressions (`+`, `+=`, `++`, ...).
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub children: Vec<Expression>,
}

impl Expression {
    pub fn child(&self, index: usize) -> Option<&Expression> {
        self.children.get(index)
    }

    pub fn operator(&self) -> &str {
        self.operator.as_deref().unwrap_or("")
    }

    /// Strips any parentheses around the expression.
    pub fn unwrapped(&self) -> &Expression {
        let mut current = self;
        while current.kind == ExpressionKind::Parenthesized {
            match current.children.first() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    pub fn type_name(&self) -> Option<&str> {
        self.result_type.as_ref().map(|t| t.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeRef {
    pub name: String,
    pub namespace: Option<String>,
    pub generic_arguments: Vec<TypeRef>,
}

impl TypeRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }

    /// `List<T>` or `T[]`: returns the element type.
    pub fn element_type(&self) -> Option<TypeRef> {
        if self.name == "List" {
            return self.generic_arguments.first().cloned();
        }
        self.name.strip_suffix("[]").map(|element| TypeRef {
            name: element.to_string(),
            namespace: self.namespace.clone(),
            generic_arguments: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MethodRef {
    pub name: String,
    pub declaring_type: TypeRef,
    pub is_static: bool,
    pub return_type: Option<TypeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemberRef {
    pub name: String,
    pub declaring_type: TypeRef,
    pub member_type: Option<TypeRef>,
}

/// Constant value of a literal expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}
