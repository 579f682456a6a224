#![allow(clippy::module_inception)]

use std::{fmt::Write, rc::Rc};

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// Nesting depth shared by the parser and the type checker before they give up.
pub const DEFAULT_MAX_NESTING: usize = 128;

/// A point in a source file. Lines and columns are 1-based, the offset is a byte index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(offset: u32, line: u32, column: u32, file: Rc<String>) -> Self {
        Position {
            offset,
            line,
            column,
            file,
        }
    }

    pub fn null() -> Self {
        Position::new(0, 1, 1, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    pub fn null() -> Self {
        Span::new(Position::null(), Position::null())
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.start.clone(), other.end.clone())
    }
}

/// Returns the text of the 1-based `line` in `source`, without its line break.
pub fn get_line(source: &str, line: u32) -> Option<&str> {
    source
        .split('\n')
        .nth(line.saturating_sub(1) as usize)
        .map(|text| text.trim_end_matches('\r'))
}

/// Renders an error with the offending source line underneath it.
///
/// ```text
/// Error: UndefinedVariable (Undefined variable g)
/// -> final.ky:1:14
///   |
/// 1 | val y: Int = g(1);
///   | -------------^
/// ```
pub fn render_error(error: &Error, source: &str) -> String {
    let span = error.get_span();
    let start = &span.start;

    let line_string = start.line.to_string();
    let padding = line_string.len() + 2;

    let mut out = String::new();

    if let ErrorTip::None = error.get_tip() {
        let _ = writeln!(out, "Error: {} ({})", error.get_error_name(), error.message());
    } else {
        let _ = writeln!(
            out,
            "Error: {} ({})\n  tip: {}",
            error.get_error_name(),
            error.message(),
            error.get_tip()
        );
    }
    let _ = writeln!(out, "-> {}:{}:{}", start.file, start.line, start.column);

    let Some(line_text) = get_line(source, start.line) else {
        return out;
    };

    let _ = writeln!(out, "{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
    let _ = writeln!(out, "{} | {}", line_string, line_text_removed.trim_end());

    let column = (start.column as usize).saturating_sub(removed_whitespace).max(1);
    let width = if span.end.line == start.line && span.end.column > start.column {
        (span.end.column - start.column) as usize
    } else {
        1
    };

    let _ = writeln!(
        out,
        "{:>padding$} {:->column$}{}",
        "|",
        "^",
        "^".repeat(width - 1)
    );

    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
