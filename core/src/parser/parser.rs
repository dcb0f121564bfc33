use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;
use tracing::debug;

use super::error::convert_pest_error;
use super::{ParseError, ParseErrorKind};
use crate::ast::{Literal, Node, NodeKind, SelectForm, Span};
use crate::stack::with_stack;

type Result<T> = core::result::Result<T, ParseError>;

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::or, Assoc::Left))            // `||`
        .op(Op::infix(Rule::and, Assoc::Left))           // `&&`
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left)
        )                                                // `==`, `!=`
        .op(
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left)
        )                                                // `<`, `>`, `<=`, `>=`
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                                // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::rem, Assoc::Left)
        )                                                // `*`, `/`, `%`
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not)) // `-`, `!`

        // Postfix operators.
        .op(Op::postfix(Rule::call_op))                  // `()`
        .op(Op::postfix(Rule::field_op))                 // `.`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/weft.pest"]
pub struct WeftParser;

/// Nesting allowed by [`parse`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Stack the grammar runs on. Comfortably holds `DEFAULT_MAX_DEPTH`
/// levels in unoptimized builds.
const PARSE_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Parse a whole program into an expression list spanning the source.
pub fn parse(source: &str) -> Result<Node> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parse with a custom limit on nesting. Every open bracket or brace
/// counts one level, as does every operator in a run of prefix operators.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Node> {
    check_nesting(source, max_depth)?;
    with_stack(PARSE_STACK_SIZE, || parse_program(source))
}

fn parse_program(source: &str) -> Result<Node> {
    let mut pairs = WeftParser::parse(Rule::program, source).map_err(convert_pest_error)?;
    let program = match pairs.next() {
        Some(program) => program,
        None => {
            return Err(ParseError::new(
                ParseErrorKind::Other {
                    message: "empty parse tree".to_string(),
                },
                Span::new(0, source.len()),
            ));
        }
    };

    let statements = parse_statements(program.into_inner())?;
    debug!(statements = statements.len(), "parsed program");
    Ok(Node::list(statements, Span::new(0, source.len())))
}

/// Reject input nested deeper than `max_depth` before it reaches the
/// recursive grammar. String literals and comments are skipped.
fn check_nesting(source: &str, max_depth: usize) -> Result<()> {
    let mut brackets = 0usize;
    let mut prefixes = 0usize;
    let mut chars = source.char_indices();

    while let Some((at, c)) = chars.next() {
        match c {
            '"' => {
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' | '\n' => break,
                        _ => {}
                    }
                }
            }
            '#' => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            ' ' | '\t' | '\r' => continue,
            '(' | '{' => brackets += 1,
            ')' | '}' => brackets = brackets.saturating_sub(1),
            '-' | '!' => prefixes += 1,
            _ => {}
        }
        if !matches!(c, '-' | '!') {
            prefixes = 0;
        }

        let depth = brackets + prefixes;
        if depth > max_depth {
            return Err(ParseError::new(
                ParseErrorKind::MaxDepthExceeded { depth, max_depth },
                Span::new(at, at + c.len_utf8()),
            ));
        }
    }
    Ok(())
}

fn parse_statements(pairs: Pairs<'_, Rule>) -> Result<Vec<Node>> {
    pairs
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .map(parse_statement)
        .collect()
}

fn parse_statement(pair: Pair<'_, Rule>) -> Result<Node> {
    match pair.as_rule() {
        Rule::function => parse_function(pair),
        Rule::assignment => parse_assignment(pair),
        Rule::expression => parse_expr(pair),
        _ => Err(malformed(&pair, "statement")),
    }
}

fn parse_function(pair: Pair<'_, Rule>) -> Result<Node> {
    let span: Span = pair.as_span().into();
    let mut inner = pair.clone().into_inner();
    let (Some(name), Some(params), Some(body)) = (inner.next(), inner.next(), inner.next()) else {
        return Err(malformed(&pair, "function declaration"));
    };

    let params = params
        .into_inner()
        .map(|param| param.as_str().to_string())
        .collect();

    let body_span: Span = body.as_span().into();
    let body = match body.as_rule() {
        Rule::block => Node::list(parse_statements(body.into_inner())?, body_span),
        _ => Node::list(vec![parse_expr(body)?], body_span),
    };

    Ok(Node::new(
        NodeKind::Function {
            name: name.as_str().to_string(),
            params,
            body: Box::new(body),
        },
        span,
    ))
}

fn parse_assignment(pair: Pair<'_, Rule>) -> Result<Node> {
    let span: Span = pair.as_span().into();
    let mut names = Vec::new();
    let mut value = None;
    for inner in pair.clone().into_inner() {
        match inner.as_rule() {
            Rule::ident => names.push(inner.as_str().to_string()),
            _ => value = Some(parse_expr(inner)?),
        }
    }
    let Some(value) = value else {
        return Err(malformed(&pair, "assignment"));
    };

    Ok(Node::new(
        NodeKind::Assignment {
            names,
            value: Box::new(value),
        },
        span,
    ))
}

/// Operators desugar into selects: `a + b` is `a.+` (infix) called with
/// `b`, and `-a` is `a.-` (prefix) called with nothing.
pub fn parse_expr(pair: Pair<'_, Rule>) -> Result<Node> {
    PRATT_PARSER
        .map_primary(parse_primary)
        .map_prefix(|op, rhs| {
            let rhs = rhs?;
            let op_span: Span = op.as_span().into();
            let span = Span::combine(&op_span, &rhs.span);
            let select = Node::select(rhs, op.as_str(), SelectForm::Prefix, op_span);
            Ok(Node::call(select, Vec::new(), span))
        })
        .map_infix(|lhs, op, rhs| {
            let (lhs, rhs) = (lhs?, rhs?);
            let span = Span::combine(&lhs.span, &rhs.span);
            let select = Node::select(lhs, op.as_str(), SelectForm::Infix, op.as_span().into());
            Ok(Node::call(select, vec![rhs], span))
        })
        .map_postfix(|lhs, op| {
            let lhs = lhs?;
            let span = Span::new(lhs.span.0.start, op.as_span().end());
            match op.as_rule() {
                Rule::call_op => {
                    let args = op.into_inner().map(parse_expr).collect::<Result<_>>()?;
                    Ok(Node::call(lhs, args, span))
                }
                Rule::field_op => {
                    let Some(field) = op.clone().into_inner().next() else {
                        return Err(malformed(&op, "field select"));
                    };
                    Ok(Node::select(lhs, field.as_str(), SelectForm::Normal, span))
                }
                _ => Err(malformed(&op, "postfix operator")),
            }
        })
        .parse(pair.into_inner())
}

fn parse_primary(pair: Pair<'_, Rule>) -> Result<Node> {
    let span: Span = pair.as_span().into();
    match pair.as_rule() {
        Rule::integer => {
            let value = pair.as_str().parse::<i64>().map_err(|_| {
                ParseError::new(
                    ParseErrorKind::InvalidNumber {
                        text: pair.as_str().to_string(),
                    },
                    span.clone(),
                )
            })?;
            Ok(Node::literal(Literal::Int(value), span))
        }
        Rule::float => {
            let value = pair.as_str().parse::<f64>().map_err(|_| {
                ParseError::new(
                    ParseErrorKind::InvalidNumber {
                        text: pair.as_str().to_string(),
                    },
                    span.clone(),
                )
            })?;
            Ok(Node::literal(Literal::Float(value), span))
        }
        Rule::string => {
            let text = pair.as_str();
            // Quotes are part of the atomic match.
            let body = &text[1..text.len() - 1];
            let value = unescape(body, span.0.start + 1)?;
            Ok(Node::literal(Literal::Str(value), span))
        }
        Rule::ident => Ok(Node::identifier(pair.as_str(), span)),
        Rule::grouped => match pair.clone().into_inner().next() {
            Some(inner) => parse_expr(inner),
            None => Err(malformed(&pair, "parenthesized expression")),
        },
        _ => Err(malformed(&pair, "expression")),
    }
}

/// Resolve `\n`, `\t`, `\"` and `\\`. `offset` is where `body` starts in the
/// source, for error spans.
fn unescape(body: &str, offset: usize) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((_, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, 'n')) => out.push('\n'),
            Some((_, 't')) => out.push('\t'),
            Some((_, '"')) => out.push('"'),
            Some((_, '\\')) => out.push('\\'),
            Some((at, escape)) => {
                let start = offset + at - 1;
                return Err(ParseError::new(
                    ParseErrorKind::InvalidEscape { escape },
                    Span::new(start, offset + at + escape.len_utf8()),
                ));
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::Other {
                        message: "string ends with a lone backslash".to_string(),
                    },
                    Span::new(offset + body.len() - 1, offset + body.len()),
                ));
            }
        }
    }
    Ok(out)
}

fn malformed(pair: &Pair<'_, Rule>, what: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::Other {
            message: format!("malformed {what}: {:?}", pair.as_rule()),
        },
        pair.as_span().into(),
    )
}
