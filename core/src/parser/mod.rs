//! Source text to AST.
//!
//! A `pest` grammar does the tokenizing and a Pratt parser resolves
//! operator precedence. Operators are not AST nodes of their own; they are
//! rewritten into field selects and calls here.

pub mod error;
pub mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{DEFAULT_MAX_DEPTH, Rule, WeftParser, parse, parse_with_max_depth};

#[cfg(test)]
mod parse_test;
