//! Public error types for the Weft API.
//!
//! Each stage keeps its own error type. [`Error`] wraps them so callers of
//! [`crate::api::Engine`] handle one type, and [`Diagnostic`] is the
//! span-carrying form front-ends render.

use core::fmt;

use thiserror::Error;

use crate::ast::Span;
use crate::bytecode::CacheError;
use crate::compiler::TranslateError;
use crate::evaluator::ExecutionError;
use crate::parser::ParseError;
use crate::stdlib::EnvironmentError;

/// Public error type for all Weft operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

impl Error {
    /// Whether the error happened before evaluation started.
    pub fn is_compilation(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::Translate(_))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::Parse(e) => e.to_diagnostic(),
            Error::Translate(e) => Diagnostic {
                severity: Severity::Error,
                message: e.kind.to_string(),
                span: Some(e.span.clone()),
                related: Vec::new(),
                help: None,
                code: Some(e.kind.code().to_string()),
            },
            Error::Execution(ExecutionError::ResourceExceeded(e)) => Diagnostic {
                severity: Severity::Error,
                message: format!("resource limit exceeded: {}", e),
                span: None,
                related: Vec::new(),
                help: Some("raise the limit with --max-depth".to_string()),
                code: Some("E002".to_string()),
            },
            Error::Execution(ExecutionError::Runtime(e)) => {
                Diagnostic::message(format!("runtime error: {}", e), "E001")
            }
            Error::Cache(e) => Diagnostic::message(e.to_string(), "C001"),
            Error::Environment(e) => Diagnostic::message(e.to_string(), "V001"),
        }
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue. Errors raised while evaluating
    /// bytecode have none.
    pub span: Option<Span>,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Optional error code (e.g., "T001") for documentation lookup.
    pub code: Option<String>,
}

impl Diagnostic {
    fn message(message: String, code: &str) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span: None,
            related: Vec::new(),
            help: None,
            code: Some(code.to_string()),
        }
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic (e.g., "first defined here").
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}
