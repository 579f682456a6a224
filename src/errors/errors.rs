use std::fmt::Display;

use thiserror::Error;

use crate::{Position, Span};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{internal_error}")]
pub struct Error {
    internal_error: ErrorImpl,
    span: Span,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, span: Span) -> Self {
        Error {
            internal_error: error_impl,
            span,
        }
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn get_position(&self) -> &Position {
        &self.span.start
    }

    pub fn internal(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// The diagnostic text, without any position information.
    pub fn message(&self) -> String {
        self.internal_error.to_string()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::WrongType { .. } => "WrongType",
            ErrorImpl::UndefinedType { .. } => "UndefinedType",
            ErrorImpl::AlreadyDefinedType { .. } => "AlreadyDefinedType",
            ErrorImpl::UndefinedMember { .. } => "UndefinedMember",
            ErrorImpl::AlreadyDefinedMember { .. } => "AlreadyDefinedMember",
            ErrorImpl::UndefinedVariable { .. } => "UndefinedVariable",
            ErrorImpl::AlreadyDefinedVariable { .. } => "AlreadyDefinedVariable",
            ErrorImpl::AssignmentToConst { .. } => "AssignmentToConst",
            ErrorImpl::Arity { .. } => "ArityError",
            ErrorImpl::InvalidReturn => "InvalidReturn",
            ErrorImpl::Typing { .. } => "TypingError",
            ErrorImpl::NestingTooDeep { .. } => "NestingTooDeep",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnterminatedString => {
                ErrorTip::Suggestion(String::from("Close the string literal with `\"`"))
            }
            ErrorImpl::AssignmentToConst { name } => ErrorTip::Suggestion(format!(
                "Declare `{}` with `var` to make it mutable",
                name
            )),
            ErrorImpl::NestingTooDeep { .. } => ErrorTip::Suggestion(String::from(
                "Split the expression or statement into smaller parts",
            )),
            _ => ErrorTip::None,
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Lexing and parsing
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unterminated string literal")]
    UnterminatedString,

    // Typing
    #[error("Expected type {expected} does not equal provided type {provided}")]
    WrongType { expected: String, provided: String },
    #[error("Undefined type {name}")]
    UndefinedType { name: String },
    #[error("Already defined type {name}")]
    AlreadyDefinedType { name: String },
    #[error("Undefined member {member} in {owner}")]
    UndefinedMember { owner: String, member: String },
    #[error("Already defined member {member} in {owner}")]
    AlreadyDefinedMember { owner: String, member: String },
    #[error("Undefined variable {name}")]
    UndefinedVariable { name: String },
    #[error("Already defined variable {name}")]
    AlreadyDefinedVariable { name: String },
    #[error("Constant variable {name} can not be mutated")]
    AssignmentToConst { name: String },
    #[error("The function {callee} requires {expected} arguments, but you provided {provided}")]
    Arity {
        callee: String,
        expected: usize,
        provided: usize,
    },
    #[error("You can only return from a function context")]
    InvalidReturn,
    #[error("{message}")]
    Typing { message: String },
    #[error("Maximum nesting depth of {limit} exceeded")]
    NestingTooDeep { limit: usize },
}

impl ErrorImpl {
    pub fn typing(message: impl Into<String>) -> Self {
        ErrorImpl::Typing {
            message: message.into(),
        }
    }
}
