//! Translation errors.

use thiserror::Error;

use crate::ast::{SelectForm, Span};
use crate::bytecode::ConstantId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct TranslateError {
    pub kind: TranslateErrorKind,
    pub span: Span,
}

impl TranslateError {
    pub fn new(kind: TranslateErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateErrorKind {
    #[error("unknown value `{name}`")]
    UnknownValue { name: String },

    #[error("unknown field `{field}`")]
    UnknownField { field: String },

    #[error("`{name}` is already defined in this scope")]
    ValueReassigned { name: String },

    #[error("field `{field}` cannot be used in {form} form")]
    MethodCalledImproperly { field: String, form: SelectForm },

    #[error("a program must be a list of statements")]
    InvalidRootExpression,

    #[error("constant pool has no entry for index {index}")]
    NonexhaustiveConstantIdMap { index: ConstantId },

    #[error("function `{name}` must be declared directly in a function body or at the top level")]
    MisplacedFunctionDeclaration { name: String },
}

impl TranslateErrorKind {
    /// Short stable code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            TranslateErrorKind::UnknownValue { .. } => "T001",
            TranslateErrorKind::UnknownField { .. } => "T002",
            TranslateErrorKind::ValueReassigned { .. } => "T003",
            TranslateErrorKind::MethodCalledImproperly { .. } => "T004",
            TranslateErrorKind::InvalidRootExpression => "T005",
            TranslateErrorKind::NonexhaustiveConstantIdMap { .. } => "T006",
            TranslateErrorKind::MisplacedFunctionDeclaration { .. } => "T007",
        }
    }
}
