//! Type checking and semantic analysis module.
//!
//! This module performs type checking and semantic analysis on the AST.
//! It transforms the untyped AST into a typed AST while:
//!
//! - Resolving every name against the scope chain
//! - Verifying type correctness and mutability of expressions and statements
//! - Resolving function, method and operator overloads
//! - Assigning every declaration an id in the declaration registry
//!
//! Each top-level statement is checked on its own. The first error inside a
//! statement abandons that statement and is collected as a diagnostic, so one
//! run can report several unrelated errors.

mod expr;
mod stmt;

pub mod environment;
pub mod registry;
pub mod type_checker;
pub mod typed_ast;
pub mod types;
