//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Operator names used for overloading
//! - Integer and string literals
//! - Line and column tracking
//! - Error cases

use crate::errors::errors::ErrorImpl;

use super::{lexer::tokenize, tokens::TokenKind};

#[test]
fn test_tokenize_keywords() {
    let source = "val var fun class new return if else while print true false".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Val);
    assert_eq!(tokens[1].kind, TokenKind::Var);
    assert_eq!(tokens[2].kind, TokenKind::Fun);
    assert_eq!(tokens[3].kind, TokenKind::Class);
    assert_eq!(tokens[4].kind, TokenKind::New);
    assert_eq!(tokens[5].kind, TokenKind::Return);
    assert_eq!(tokens[6].kind, TokenKind::If);
    assert_eq!(tokens[7].kind, TokenKind::Else);
    assert_eq!(tokens[8].kind, TokenKind::While);
    assert_eq!(tokens[9].kind, TokenKind::Print);
    assert_eq!(tokens[10].kind, TokenKind::True);
    assert_eq!(tokens[11].kind, TokenKind::False);
    assert_eq!(tokens[12].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 _underscore CamelCase values".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[2].value, "baz_123");
    assert_eq!(tokens[3].value, "_underscore");
    assert_eq!(tokens[4].value, "CamelCase");
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
    assert_eq!(tokens[5].value, "values");
    assert_eq!(tokens[6].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_operator_names() {
    let source = "operator+ operator== operator<= operator! operators operator -".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "operator+");
    assert_eq!(tokens[1].value, "operator==");
    assert_eq!(tokens[2].value, "operator<=");
    assert_eq!(tokens[3].value, "operator!");
    assert_eq!(tokens[4].value, "operators");
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
    assert_eq!(tokens[5].value, "operator");
    assert_eq!(tokens[6].kind, TokenKind::Dash);
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 0 2147483647 2147483648".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].as_int(), Some(42));
    assert_eq!(tokens[1].as_int(), Some(0));
    assert_eq!(tokens[2].as_int(), Some(i32::MAX));
    assert_eq!(tokens[3].kind, TokenKind::Number);
    assert_eq!(tokens[3].as_int(), None);
}

#[test]
fn test_tokenize_string_escapes() {
    let source = r#""hello\nworld" "tab\there" "backslash\\" "quote\"test" """#.to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].as_string(), Some("hello\nworld"));
    assert_eq!(tokens[1].as_string(), Some("tab\there"));
    assert_eq!(tokens[2].as_string(), Some("backslash\\"));
    assert_eq!(tokens[3].as_string(), Some("quote\"test"));
    assert_eq!(tokens[4].as_string(), Some(""));
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_operators() {
    let source = "+ - * / == != < > <= >= = ! ->".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Plus);
    assert_eq!(tokens[1].kind, TokenKind::Dash);
    assert_eq!(tokens[2].kind, TokenKind::Star);
    assert_eq!(tokens[3].kind, TokenKind::Slash);
    assert_eq!(tokens[4].kind, TokenKind::Equals);
    assert_eq!(tokens[5].kind, TokenKind::NotEquals);
    assert_eq!(tokens[6].kind, TokenKind::Less);
    assert_eq!(tokens[7].kind, TokenKind::Greater);
    assert_eq!(tokens[8].kind, TokenKind::LessEquals);
    assert_eq!(tokens[9].kind, TokenKind::GreaterEquals);
    assert_eq!(tokens[10].kind, TokenKind::Assignment);
    assert_eq!(tokens[11].kind, TokenKind::Not);
    assert_eq!(tokens[12].kind, TokenKind::Arrow);
    assert_eq!(tokens[13].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_punctuation() {
    let source = "( ) { } . , ; :".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::OpenParen);
    assert_eq!(tokens[1].kind, TokenKind::CloseParen);
    assert_eq!(tokens[2].kind, TokenKind::OpenCurly);
    assert_eq!(tokens[3].kind, TokenKind::CloseCurly);
    assert_eq!(tokens[4].kind, TokenKind::Dot);
    assert_eq!(tokens[5].kind, TokenKind::Comma);
    assert_eq!(tokens[6].kind, TokenKind::Semicolon);
    assert_eq!(tokens[7].kind, TokenKind::Colon);
    assert_eq!(tokens[8].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_comments() {
    let source = "val x = 5; // this is a comment\nval y = 10;".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Val);
    assert_eq!(tokens[1].value, "x");
    assert_eq!(tokens[3].value, "5");
    assert_eq!(tokens[4].kind, TokenKind::Semicolon);
    assert_eq!(tokens[5].kind, TokenKind::Val);
    assert_eq!(tokens[6].value, "y");
    assert_eq!(tokens[10].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_tracks_lines_and_columns() {
    let source = "val x = 1;\n  var yy = \"a\nb\";\nx".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].span.start.line, 1);
    assert_eq!(tokens[0].span.start.column, 1);
    assert_eq!(tokens[1].span.start.column, 5);

    // var
    assert_eq!(tokens[5].span.start.line, 2);
    assert_eq!(tokens[5].span.start.column, 3);
    // yy
    assert_eq!(tokens[6].span.start.column, 7);
    assert_eq!(tokens[6].span.end.column, 9);

    // the string spans a line break, so `;` and `x` move down
    assert_eq!(tokens[8].kind, TokenKind::String);
    assert_eq!(tokens[9].span.start.line, 3);
    assert_eq!(tokens[9].span.start.column, 3);
    assert_eq!(tokens[10].span.start.line, 4);
    assert_eq!(tokens[10].span.start.column, 1);
    assert_eq!(*tokens[10].span.start.file, "test.ky");
}

#[test]
fn test_tokenize_function_declaration() {
    let source = "fun add(a: Int, var b: Int): Int { return a + b; }".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Fun);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].value, "add");
    assert_eq!(tokens[2].kind, TokenKind::OpenParen);
    assert_eq!(tokens[3].value, "a");
    assert_eq!(tokens[4].kind, TokenKind::Colon);
    assert_eq!(tokens[7].kind, TokenKind::Var);
}

#[test]
fn test_tokenize_unrecognized_token() {
    let source = "val x = @;".to_string();
    let error = tokenize(source, Some("test.ky".to_string())).unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().column, 9);
}

#[test]
fn test_tokenize_unterminated_string() {
    let source = "val s = \"abc".to_string();
    let error = tokenize(source, Some("test.ky".to_string())).unwrap_err();

    assert!(matches!(error.internal(), ErrorImpl::UnterminatedString));
}

#[test]
fn test_tokenize_mixed_expression() {
    let source = "x + 5 * (y - 3)".to_string();
    let tokens = tokenize(source, Some("test.ky".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].kind, TokenKind::Plus);
    assert_eq!(tokens[2].kind, TokenKind::Number);
    assert_eq!(tokens[3].kind, TokenKind::Star);
    assert_eq!(tokens[4].kind, TokenKind::OpenParen);
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
    assert_eq!(tokens[6].kind, TokenKind::Dash);
    assert_eq!(tokens[7].kind, TokenKind::Number);
    assert_eq!(tokens[8].kind, TokenKind::CloseParen);
    assert_eq!(tokens[9].kind, TokenKind::EOF);
}
