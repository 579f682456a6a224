use crate::Span;

use super::{
    expressions::{
        AssignmentExpr, BinaryExpr, BoolExpr, CallExpr, GroupExpr, InstantiationExpr, LambdaExpr,
        MemberExpr, NumberExpr, PrefixExpr, StringExpr, SymbolExpr,
    },
    statements::{
        BlockStmt, ClassDeclStmt, ExpressionStmt, FnDeclStmt, IfStmt, PrintStmt, ReturnStmt,
        VarDeclStmt, WhileStmt,
    },
};

/// Statement Kinds
///
/// The closed set of statements the parser produces.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(ExpressionStmt),
    VarDecl(VarDeclStmt),
    ClassDecl(ClassDeclStmt),
    FnDecl(FnDeclStmt),
    Return(ReturnStmt),
    Block(BlockStmt),
    If(IfStmt),
    While(WhileStmt),
    Print(PrintStmt),
}

/// A statement together with the source it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }
}

/// Expression Kinds
///
/// The closed set of expressions the parser produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(NumberExpr),
    String(StringExpr),
    Bool(BoolExpr),
    Symbol(SymbolExpr),
    Member(MemberExpr),
    Assignment(AssignmentExpr),
    Binary(BinaryExpr),
    Prefix(PrefixExpr),
    Call(CallExpr),
    Instantiation(InstantiationExpr),
    Lambda(LambdaExpr),
    Group(GroupExpr),
}

/// An expression together with the source it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    /// Whether the expression may appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(self.kind, ExprKind::Symbol(_) | ExprKind::Member(_))
    }
}
