//! Bytecode translator for Weft programs.
//!
//! Walks the AST once and emits a flat instruction stream plus a
//! deduplicated constant pool.
//!
//! ## Design
//!
//! - One compile-time scope per function body; ids continue the enclosing
//!   scope's counter, parameters first, then hoisted functions
//! - Constants are interned unit-wide but materialized once per scope
//! - A statement list always ends with the newest value of its scope
//! - Errors abort translation; no partial bytecode is returned

mod error;
mod translator;


pub use error::{TranslateError, TranslateErrorKind};
pub use translator::{finalize_constants, translate};
