//! Typed Abstract Syntax Tree definitions.
//!
//! This module contains the typed variants of AST nodes produced by
//! the type checker. The typed tree mirrors the untyped one, but:
//! - every expression carries its [`AppliedType`]
//! - declarations, variable references and direct calls carry a [`DeclId`]
//! - operators record the method they resolved to, when it is user-defined
//!
//! Backends consume this tree together with the committed registry.

use std::rc::Rc;

use crate::Span;

use super::{
    registry::DeclId,
    types::{AppliedType, ClassType, FunctionType},
};

#[derive(Debug, Clone)]
pub struct TypedStmt {
    pub kind: TypedStmtKind,
    pub span: Span,
}

impl TypedStmt {
    pub fn new(kind: TypedStmtKind, span: Span) -> Self {
        TypedStmt { kind, span }
    }
}

#[derive(Debug, Clone)]
pub enum TypedStmtKind {
    Expression(TypedExpr),
    VarDecl {
        decl: DeclId,
        initializer: Option<TypedExpr>,
    },
    ClassDecl {
        class: Rc<ClassType>,
        constructor_parameters: Vec<DeclId>,
        members: Vec<TypedStmt>,
    },
    FnDecl {
        decl: DeclId,
        function: Rc<FunctionType>,
        parameters: Vec<DeclId>,
        body: Vec<TypedStmt>,
    },
    Return(Option<TypedExpr>),
    Block(Vec<TypedStmt>),
    If {
        condition: TypedExpr,
        then_body: Box<TypedStmt>,
        else_body: Option<Box<TypedStmt>>,
    },
    While {
        condition: TypedExpr,
        body: Box<TypedStmt>,
    },
    Print(TypedExpr),
}

#[derive(Debug, Clone)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: AppliedType,
    pub span: Span,
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: AppliedType, span: Span) -> Self {
        TypedExpr { kind, ty, span }
    }
}

/// What a call expression ended up calling.
#[derive(Debug, Clone)]
pub enum Callee {
    /// A named function overload from scope.
    Function(DeclId),
    /// A method overload on the receiver's type.
    Method {
        receiver: Box<TypedExpr>,
        name: String,
        decl: Option<DeclId>,
    },
    /// Any other function-typed value.
    Value(Box<TypedExpr>),
}

/// The place an assignment writes to.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    Variable(DeclId),
    Member {
        owner: Box<TypedExpr>,
        name: String,
        decl: DeclId,
    },
}

#[derive(Debug, Clone)]
pub enum TypedExprKind {
    Int(i32),
    Bool(bool),
    String(String),
    /// A variable or a function referenced by name.
    Variable {
        name: String,
        decl: DeclId,
    },
    Member {
        owner: Box<TypedExpr>,
        name: String,
        decl: Option<DeclId>,
    },
    Assign {
        target: AssignTarget,
        value: Box<TypedExpr>,
    },
    /// Operator resolved to a method of the left operand. `method` is `None` for built-ins.
    Binary {
        left: Box<TypedExpr>,
        operator: String,
        right: Box<TypedExpr>,
        method: Option<DeclId>,
    },
    Prefix {
        operator: String,
        operand: Box<TypedExpr>,
        method: Option<DeclId>,
    },
    Call {
        callee: Callee,
        arguments: Vec<TypedExpr>,
    },
    Instantiate {
        class: Rc<ClassType>,
        arguments: Vec<TypedExpr>,
    },
    Lambda {
        function: Rc<FunctionType>,
        parameters: Vec<DeclId>,
        body: Vec<TypedStmt>,
    },
}
