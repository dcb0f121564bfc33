//! Evaluation errors.
//!
//! # Error Categories
//!
//! - **Runtime errors**: the program did something invalid (called a
//!   non-function, divided by zero, selected an unknown field).
//! - **Resource exceeded errors**: the program hit a configured limit.
//!
//! Both are fatal to the unit being evaluated.

use thiserror::Error;

use crate::ast::SelectForm;
use crate::bytecode::{ConstantId, ValueId};
use crate::graph::GraphError;
use crate::values::Kind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    ResourceExceeded(#[from] ResourceExceededError),
}

impl ExecutionError {
    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            ExecutionError::Runtime(e) => Some(e),
            ExecutionError::ResourceExceeded(_) => None,
        }
    }
}

impl From<GraphError> for ExecutionError {
    fn from(e: GraphError) -> Self {
        RuntimeError::MalformedBytecode {
            reason: e.to_string(),
        }
        .into()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("{function} expects {expected} argument(s), got {got}")]
    IncorrectCallArgumentCount {
        function: String,
        expected: String,
        got: usize,
    },

    #[error("argument {index} of {function} must be {expected}, got {got}")]
    IncorrectBuiltInFunctionArgumentType {
        function: String,
        index: usize,
        expected: Kind,
        got: &'static str,
    },

    #[error("cannot call a value of type {type_name}")]
    NonFunctionCalled { type_name: &'static str },

    #[error("field name constant #{constant} is not a string")]
    NonStringFieldName { constant: ConstantId },

    #[error("{type_name} has no field `{field}`")]
    UnknownField {
        field: String,
        type_name: &'static str,
    },

    #[error("{unprocessed} block(s) could not be scheduled because of a dependency cycle")]
    ValueCycle { unprocessed: usize },

    #[error("function body has no blocks")]
    EmptyFunctionBlockGraph,

    #[error("division by zero")]
    DivisionByZero,

    #[error("`{method}` must return a {expected}, got {got}")]
    UniversalMethodReturnedIncorrectValue {
        method: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("field `{field}` cannot be used in {form} form")]
    MethodCalledImproperly { field: String, form: SelectForm },

    #[error("library `{library}` has no symbol `{symbol}`")]
    LibrarySymbolNotFound { library: String, symbol: String },

    #[error("integer overflow in `{operation}`")]
    IntegerOverflow { operation: &'static str },

    #[error("index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("value v{id} is not available")]
    UnresolvedValue { id: ValueId },

    #[error("malformed bytecode: {reason}")]
    MalformedBytecode { reason: String },

    #[error("cannot import `{module}`: no module loader is configured")]
    ModuleUnavailable { module: String },

    #[error("failed to load module `{module}`: {message}")]
    ModuleLoad { module: String, message: String },

    #[error("failed to write output: {message}")]
    Output { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceExceededError {
    #[error("evaluation stack overflow: depth {depth} exceeds maximum of {max_depth}")]
    StackOverflow { depth: usize, max_depth: usize },
}
