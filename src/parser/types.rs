//! Type parsing implementation.
//!
//! This module handles parsing of type annotations. It supports:
//!
//! - Named types (`Int`, class names)
//! - Function types (`Function(Int, Int) -> Bool`)
//!
//! Like expression parsing, it dispatches through a NUD lookup table
//! keyed by the current token.

use std::collections::HashMap;

use crate::{
    ast::types::{FunctionTypeAnnotation, SymbolType, TypeAnnotation},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeAnnotation, Error>;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Name that introduces a function type annotation.
pub const FUNCTION_TYPE_NAME: &str = "Function";

/// Initializes the type parsing lookup tables.
///
/// # Arguments
///
/// * `parser` - Mutable reference to the parser to initialize
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    if parser.current_token().value == FUNCTION_TYPE_NAME && parser.peek_kind(1) == TokenKind::OpenParen {
        return parse_function_type(parser);
    }

    let token = parser.expect(TokenKind::Identifier)?;
    Ok(TypeAnnotation::Symbol(SymbolType {
        name: token.value,
        span: token.span,
    }))
}

pub fn parse_function_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = vec![];
    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            parameters.push(parse_type(parser)?);

            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
            } else {
                break;
            }
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    let error = parser.detailed_error("function types need a `->` return type");
    parser.expect_error(TokenKind::Arrow, Some(error))?;
    let return_type = parse_type(parser)?;

    Ok(TypeAnnotation::Function(FunctionTypeAnnotation {
        parameters,
        return_type: Box::new(return_type),
        span: parser.span_from(start),
    }))
}

pub fn parse_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    parser.enter()?;

    let token_kind = parser.current_token_kind();
    let result = match parser.get_type_nud_lookup().get(&token_kind).copied() {
        Some(nud_fn) => nud_fn(parser),
        None => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.current_token().span.clone(),
        )),
    };

    parser.leave();
    result
}
