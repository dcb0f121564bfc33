use thiserror::Error;

use crate::api::{Diagnostic, Severity};
use crate::ast::Span;
use crate::parser::Rule;

/// Parser error with the span it points at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("invalid number literal `{text}`")]
    InvalidNumber { text: String },

    #[error("unknown escape sequence `\\{escape}`")]
    InvalidEscape { escape: char },

    #[error("expression nesting depth {depth} exceeds maximum of {max_depth} levels")]
    MaxDepthExceeded { depth: usize, max_depth: usize },

    #[error("{message}")]
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { .. } => ("P001", None),
            ParseErrorKind::InvalidNumber { .. } => {
                ("P002", Some("integers must fit in 64 bits".to_string()))
            }
            ParseErrorKind::InvalidEscape { .. } => (
                "P003",
                Some("supported escapes are \\n, \\t, \\\" and \\\\".to_string()),
            ),
            ParseErrorKind::MaxDepthExceeded { .. } => (
                "P004",
                Some("split deeply nested expressions into named values".to_string()),
            ),
            ParseErrorKind::Other { .. } => ("P999", None),
        };

        Diagnostic {
            severity: Severity::Error,
            message: self.kind.to_string(),
            span: Some(self.span.clone()),
            related: Vec::new(),
            help,
            code: Some(code.to_string()),
        }
    }
}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>) -> ParseError {
    use pest::error::{ErrorVariant, InputLocation};

    let span = match err.location {
        InputLocation::Pos(pos) => Span::new(pos, pos),
        InputLocation::Span((start, end)) => Span::new(start, end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => ParseErrorKind::UnexpectedToken {
            expected: format_expected_rules(&positives),
            found: format_found_rules(&negatives),
        },
        ErrorVariant::CustomError { message } => ParseErrorKind::Other { message },
    };

    ParseError::new(kind, span)
}

/// Group the rules pest expected into the concepts a user would name.
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::integer | Rule::float | Rule::string => "literal",
            Rule::ident => "identifier",
            Rule::field => "field name",
            Rule::EOI => "end of input",
            Rule::or
            | Rule::and
            | Rule::eq
            | Rule::ne
            | Rule::le
            | Rule::ge
            | Rule::lt
            | Rule::gt
            | Rule::add
            | Rule::sub
            | Rule::mul
            | Rule::div
            | Rule::rem => "operator",
            Rule::call_op | Rule::field_op => "call or field",
            _ => "expression",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.split_last() {
        None => "something else".to_string(),
        Some((only, [])) => only.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

fn format_found_rules(rules: &[Rule]) -> String {
    match rules.first() {
        None => "unexpected token".to_string(),
        Some(Rule::ident) => "identifier".to_string(),
        Some(Rule::integer) => "integer".to_string(),
        Some(Rule::float) => "floating-point number".to_string(),
        Some(Rule::string) => "string".to_string(),
        Some(Rule::EOI) => "end of input".to_string(),
        Some(rule) => format!("{:?}", rule),
    }
}
