use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{
            AssignmentExpr, BinaryExpr, BoolExpr, CallExpr, GroupExpr, InstantiationExpr,
            LambdaExpr, MemberExpr, NumberExpr, PrefixExpr, StringExpr, SymbolExpr,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser, stmt::parse_signature};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    parser.enter()?;
    let result = parse_expr_inner(parser, bp);
    parser.leave();
    result
}

fn parse_expr_inner(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud_fn) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken { token: parser.current_token().value.clone() },
            parser.current_token().span.clone(),
        ));
    };

    let mut left = nud_fn(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser.get_bp_lookup().get(&token_kind).unwrap_or(&BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let Some(led_fn) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: parser.current_token().value.clone() },
                parser.current_token().span.clone(),
            ));
        };

        left = led_fn(parser, left, next_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();

    let kind = match token.kind {
        TokenKind::Number => match token.as_int() {
            Some(value) => ExprKind::Number(NumberExpr { value }),
            None => {
                return Err(Error::new(ErrorImpl::NumberParseError { token: token.value.clone() }, token.span.clone()));
            }
        },
        TokenKind::Identifier => ExprKind::Symbol(SymbolExpr { value: token.value.clone() }),
        TokenKind::String => ExprKind::String(StringExpr { value: token.as_string().unwrap_or_default().to_string() }),
        TokenKind::True => ExprKind::Bool(BoolExpr { value: true }),
        TokenKind::False => ExprKind::Bool(BoolExpr { value: false }),
        _ => {
            return Err(Error::new(ErrorImpl::UnexpectedToken { token: token.value.clone() }, token.span.clone()));
        }
    };

    parser.advance();
    Ok(Expr::new(kind, token.span))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();

    let right = parse_expr(parser, bp)?;
    let span = left.get_span().to(right.get_span());

    Ok(Expr::new(
        ExprKind::Binary(BinaryExpr {
            left: Box::new(left),
            operator: operator_token,
            right: Box::new(right),
        }),
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let rhs = parse_expr(parser, BindingPower::Unary)?;
    let span = operator_token.span.to(rhs.get_span());

    Ok(Expr::new(
        ExprKind::Prefix(PrefixExpr {
            operator: operator_token,
            right_expr: Box::new(rhs),
        }),
        span,
    ))
}

pub fn parse_assignment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    if !left.is_assignable() {
        return Err(parser.detailed_error("invalid assignment target"));
    }

    parser.advance();
    // One step below assignment, so `a = b = c` nests to the right.
    let rhs = parse_expr(parser, BindingPower::Comma)?;
    let span = left.get_span().to(rhs.get_span());

    Ok(Expr::new(
        ExprKind::Assignment(AssignmentExpr {
            assignee: Box::new(left),
            value: Box::new(rhs),
        }),
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(
        ExprKind::Group(GroupExpr { inner: Box::new(expr) }),
        parser.span_from(start),
    ))
}

/// Parses a parenthesised, comma separated argument list.
pub fn parse_arguments(parser: &mut Parser) -> Result<Vec<Expr>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut args = vec![];

    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            args.push(parse_expr(parser, BindingPower::Default)?);

            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
            } else {
                break;
            }
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(args)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let arguments = parse_arguments(parser)?;
    let span = parser.span_from(left.get_span().start.clone());

    Ok(Expr::new(
        ExprKind::Call(CallExpr {
            callee: Box::new(left),
            arguments,
        }),
        span,
    ))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();

    let error = parser.detailed_error("expected member name after `.`");
    let member = parser.expect_error(TokenKind::Identifier, Some(error))?;
    let span = left.get_span().to(&member.span);

    Ok(Expr::new(
        ExprKind::Member(MemberExpr {
            owner: Box::new(left),
            member: member.value,
            member_span: member.span,
        }),
        span,
    ))
}

pub fn parse_instantiation_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // new Point(1, 2)
    let start = parser.advance().span.start.clone();

    let error = parser.detailed_error("expected class name after `new`");
    let class_name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let arguments = parse_arguments(parser)?;

    Ok(Expr::new(
        ExprKind::Instantiation(InstantiationExpr { class_name, arguments }),
        parser.span_from(start),
    ))
}

pub fn parse_lambda_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // fun (a: Int): Int { ... }
    let start = parser.advance().span.start.clone();
    let signature = parse_signature(parser)?;

    Ok(Expr::new(
        ExprKind::Lambda(LambdaExpr { signature }),
        parser.span_from(start),
    ))
}
