use crate::{
    ast::{
        ast::{Stmt, StmtKind},
        statements::{
            BlockStmt, ClassDeclStmt, ExpressionStmt, FnDeclStmt, FunctionSignature, IfStmt,
            Parameter, PrintStmt, ReturnStmt, VarDeclStmt, WhileStmt,
        },
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parser.enter()?;
    let result = match parser.get_stmt_lookup().get(&parser.current_token_kind()).copied() {
        Some(stmt_fn) => stmt_fn(parser),
        None => parse_expression_stmt(parser),
    };
    parser.leave();
    result
}

fn parse_expression_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(expr.get_span().start.clone());
    Ok(Stmt::new(StmtKind::Expression(ExpressionStmt { expression: expr }), span))
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start_token = parser.advance().clone();
    let is_mutable = start_token.kind == TokenKind::Var;

    let error = parser.detailed_error("expected identifier during variable declaration");
    let variable = parser.expect_error(TokenKind::Identifier, Some(error))?;

    let explicit_type = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        Some(parse_type(parser)?)
    } else {
        None
    };

    // Missing types and values are left to the type checker to report.
    let assigned_value = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::new(
        StmtKind::VarDecl(VarDeclStmt {
            identifier: variable.value,
            identifier_span: variable.span,
            is_mutable,
            explicit_type,
            assigned_value,
        }),
        parser.span_from(start_token.span.start),
    ))
}

/// Parses `[val|var] name: Type`.
fn parse_parameter(parser: &mut Parser) -> Result<Parameter, Error> {
    let start = parser.get_position();

    let is_mutable = match parser.current_token_kind() {
        TokenKind::Var => {
            parser.advance();
            true
        }
        TokenKind::Val => {
            parser.advance();
            false
        }
        _ => false,
    };

    let error = parser.detailed_error("expected parameter name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let error = parser.detailed_error("parameters need an explicit type");
    parser.expect_error(TokenKind::Colon, Some(error))?;
    let ty = parse_type(parser)?;

    Ok(Parameter {
        name,
        is_mutable,
        ty,
        span: parser.span_from(start),
    })
}

/// Parses a parenthesised, comma separated parameter list.
fn parse_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = vec![];

    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            parameters.push(parse_parameter(parser)?);

            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
            } else {
                break;
            }
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(parameters)
}

/// Parses `(parameters) [: Type | -> Type] { body }`, shared by named functions and lambdas.
pub fn parse_signature(parser: &mut Parser) -> Result<FunctionSignature, Error> {
    let parameters = parse_parameters(parser)?;

    let return_type = match parser.current_token_kind() {
        TokenKind::Colon | TokenKind::Arrow => {
            parser.advance();
            Some(parse_type(parser)?)
        }
        _ => None,
    };

    let body = parse_block(parser)?;

    Ok(FunctionSignature {
        parameters,
        return_type,
        body,
    })
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    // `fun (` starts a lambda used as an expression statement.
    if parser.peek_kind(1) != TokenKind::Identifier {
        return parse_expression_stmt(parser);
    }

    let start = parser.advance().span.start.clone();
    let name = parser.advance().clone();
    let signature = parse_signature(parser)?;

    Ok(Stmt::new(
        StmtKind::FnDecl(FnDeclStmt {
            name: name.value,
            name_span: name.span,
            signature,
        }),
        parser.span_from(start),
    ))
}

pub fn parse_class_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let error = parser.detailed_error("expected class name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?;

    let constructor_parameters = if parser.current_token_kind() == TokenKind::OpenParen {
        parse_parameters(parser)?
    } else {
        vec![]
    };

    parser.expect(TokenKind::OpenCurly)?;

    let mut members = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let member = match parser.current_token_kind() {
            TokenKind::Val | TokenKind::Var => parse_var_decl_stmt(parser)?,
            TokenKind::Fun if parser.peek_kind(1) == TokenKind::Identifier => parse_fn_decl_stmt(parser)?,
            _ => return Err(parser.detailed_error("expected member declaration in class body")),
        };
        members.push(member);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::new(
        StmtKind::ClassDecl(ClassDeclStmt {
            name: name.value,
            name_span: name.span,
            constructor_parameters,
            members,
        }),
        parser.span_from(start),
    ))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() == TokenKind::Semicolon {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::new(StmtKind::Return(ReturnStmt { value }), parser.span_from(start)))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_body = parse_stmt(parser)?;

    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::new(
        StmtKind::If(IfStmt {
            condition,
            then_body: Box::new(then_body),
            else_body,
        }),
        parser.span_from(start),
    ))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::new(
        StmtKind::While(WhileStmt {
            condition,
            body: Box::new(body),
        }),
        parser.span_from(start),
    ))
}

pub fn parse_print_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::new(StmtKind::Print(PrintStmt { value }), parser.span_from(start)))
}

/// Parses `{ statements }`.
pub fn parse_block(parser: &mut Parser) -> Result<BlockStmt, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.detailed_error("expected `}` to close the block"));
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(BlockStmt {
        body: statements,
        span: parser.span_from(start),
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let block = parse_block(parser)?;
    let span = block.span.clone();

    Ok(Stmt::new(StmtKind::Block(block), span))
}
