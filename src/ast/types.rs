use std::fmt::Display;

use crate::Span;

/// A type as written in source, before name resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    Symbol(SymbolType),
    Function(FunctionTypeAnnotation),
}

impl TypeAnnotation {
    pub fn get_span(&self) -> &Span {
        match self {
            TypeAnnotation::Symbol(symbol) => &symbol.span,
            TypeAnnotation::Function(function) => &function.span,
        }
    }
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAnnotation::Symbol(symbol) => write!(f, "{}", symbol.name),
            TypeAnnotation::Function(function) => {
                let parameters = function
                    .parameters
                    .iter()
                    .map(|parameter| parameter.to_string())
                    .collect::<Vec<_>>();
                write!(f, "Function({}) -> {}", parameters.join(", "), function.return_type)
            }
        }
    }
}

/// A named type such as `Int` or a class name.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolType {
    pub name: String,
    pub span: Span,
}

/// `Function(P1, P2) -> R`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTypeAnnotation {
    pub parameters: Vec<TypeAnnotation>,
    pub return_type: Box<TypeAnnotation>,
    pub span: Span,
}
