//! Weft - a dataflow scripting language
//!
//! # Overview
//!
//! Weft programs are lists of statements that bind names once. Source is
//! translated into a flat bytecode stream, the stream is regrouped into a
//! graph of blocks, and the graph is evaluated in dependency order rather
//! than in source order. Independent blocks may run in parallel.
//!
//! # Quick Start
//!
//! ```
//! use weft::{Engine, EngineOptions, Value};
//!
//! let mut engine = Engine::new(EngineOptions::default());
//! engine.register("width", 6i64).unwrap();
//!
//! let program = engine.compile("fn area(h): width * h\narea(7)").unwrap();
//! let result = program.run(&engine.runtime()).unwrap();
//! assert_eq!(result, Value::Int(42));
//! ```
//!
//! # Errors
//!
//! Every stage reports through [`Error`]. [`render_error`] turns one into an
//! annotated source listing.

mod error_renderer;

// Re-export public API from weft_core
pub use weft_core::api::{
    CacheOptions, CompiledProgram, Diagnostic, Engine, EngineOptions, Error, ExecutionOptions,
    RelatedInfo, Severity,
};

// Re-export the pieces hosts work with directly
pub use weft_core::bytecode::{self, Bytecode, BytecodeCache};
pub use weft_core::evaluator::{CallContext, CapturedOutput, ExecutionError, Runtime, RuntimeError};
pub use weft_core::graph::{self, BlockGraph, Schedule};
pub use weft_core::modules::{self, ModuleClient, ModuleRequest};
pub use weft_core::stdlib::Environment;
pub use weft_core::values::{self, Function, NativeFunction, Value};

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
