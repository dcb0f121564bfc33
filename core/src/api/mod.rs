//! Public API for the Weft language.
//!
//! An [`Engine`] compiles source text against a built-in environment into a
//! [`CompiledProgram`], which runs on a [`crate::evaluator::Runtime`].
//!
//! # Example
//!
//! ```
//! use weft_core::api::{Engine, EngineOptions};
//! use weft_core::values::Value;
//!
//! let mut engine = Engine::new(EngineOptions::default());
//! engine.register("answer", 42i64).unwrap();
//!
//! let program = engine.compile("answer + 1").unwrap();
//! let value = program.run(&engine.runtime()).unwrap();
//! assert_eq!(value, Value::Int(43));
//! ```

pub mod engine;
pub mod error;
pub mod options;

pub use engine::{CompiledProgram, Engine};
pub use error::{Diagnostic, Error, RelatedInfo, Severity};
pub use options::{CacheOptions, EngineOptions, ExecutionOptions};
