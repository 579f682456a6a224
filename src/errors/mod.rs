//! Error types and error handling for the front end.
//!
//! This module defines the error types used by every phase. It includes:
//!
//! - Error structures with source span information
//! - The closed set of lexing, parsing and typing error variants
//! - The ordered diagnostics collection produced by the type checker

pub mod diagnostics;
pub mod errors;
