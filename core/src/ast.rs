//! Abstract syntax tree consumed by the translator.
//!
//! The node set is intentionally small: expression lists, assignments,
//! calls, field selects, function declarations, identifiers and literals.
//! Operators never appear as dedicated nodes; `a + b` is a call of the
//! infix select `a.+` with the single argument `b`.

use core::fmt;
use core::ops::Range;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }
    pub fn combine(a: &Span, b: &Span) -> Span {
        Span::new(a.0.start, b.0.end)
    }
    pub fn str_of<'a>(&self, source: &'a str) -> &'a str {
        &source[self.0.start..self.0.end]
    }
}

impl From<pest::Span<'_>> for Span {
    fn from(s: pest::Span<'_>) -> Self {
        Span::new(s.start(), s.end())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.0.start, self.0.end)
    }
}

/// Syntactic shape a field select is used in.
///
/// Checked against the calling convention declared by the field: `a + b`
/// selects `+` in infix form, `-a` selects `-` in prefix form, and `a.len()`
/// is a normal select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectForm {
    Normal,
    Infix,
    Prefix,
}

impl fmt::Display for SelectForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectForm::Normal => write!(f, "normal"),
            SelectForm::Infix => write!(f, "infix"),
            SelectForm::Prefix => write!(f, "prefix"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Statements evaluated in order; the value of the list is the value of
    /// its last statement.
    ExpressionList(Vec<Node>),

    /// `a, b = value` binds every name to the same value.
    Assignment { names: Vec<String>, value: Box<Node> },

    Call { callee: Box<Node>, args: Vec<Node> },

    Select {
        value: Box<Node>,
        field: String,
        form: SelectForm,
    },

    /// `fn name(params): body`. The body is an expression list.
    Function {
        name: String,
        params: Vec<String>,
        body: Box<Node>,
    },

    Identifier(String),

    Literal(Literal),
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn list(items: Vec<Node>, span: Span) -> Self {
        Self::new(NodeKind::ExpressionList(items), span)
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Self::new(NodeKind::Identifier(name.into()), span)
    }

    pub fn literal(literal: Literal, span: Span) -> Self {
        Self::new(NodeKind::Literal(literal), span)
    }

    pub fn call(callee: Node, args: Vec<Node>, span: Span) -> Self {
        Self::new(
            NodeKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        )
    }

    pub fn select(value: Node, field: impl Into<String>, form: SelectForm, span: Span) -> Self {
        Self::new(
            NodeKind::Select {
                value: Box::new(value),
                field: field.into(),
                form,
            },
            span,
        )
    }

    /// Whether this node is a function declaration.
    pub fn is_function(&self) -> bool {
        matches!(self.kind, NodeKind::Function { .. })
    }
}
