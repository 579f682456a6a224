use crate::{lexer::tokens::Token, Span};

use super::{ast::Expr, statements::FunctionSignature};

#[derive(Debug, Clone, PartialEq)]
pub struct NumberExpr {
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringExpr {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolExpr {
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolExpr {
    pub value: String,
}

/// `owner.member`
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub owner: Box<Expr>,
    pub member: String,
    pub member_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpr {
    pub assignee: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpr {
    pub operator: Token,
    pub right_expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
}

/// `new Name(arguments)`
#[derive(Debug, Clone, PartialEq)]
pub struct InstantiationExpr {
    pub class_name: String,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub signature: FunctionSignature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupExpr {
    pub inner: Box<Expr>,
}
