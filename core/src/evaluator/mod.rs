//! Block-graph evaluator.
//!
//! A unit is evaluated level by level. Each level gets a fresh runtime
//! scope; its blocks are handed to [`crate::graph::peel_with`], which runs
//! a block once every block it reads from has written its value.
//!
//! Function blocks do not run their body: they store a closure capturing
//! the current scope, and the body is evaluated on each call. Scopes are
//! reference counted, so an activation is freed once no closure over it
//! remains.
//!
//! ## Example
//!
//! ```ignore
//! let runtime = Runtime::new(ExecutionOptions::default());
//! let value = evaluator::evaluate(&runtime.context(), &bytecode, environment)?;
//! ```

mod error;
mod interpreter;
mod runtime;
mod scope;

#[cfg(test)]
mod eval_test;

pub use error::{ExecutionError, ResourceExceededError, RuntimeError};
pub use interpreter::{Unit, evaluate, evaluate_graph};
pub use runtime::{CallContext, CapturedOutput, Runtime};
pub use scope::RuntimeScope;
