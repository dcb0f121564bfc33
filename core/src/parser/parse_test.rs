use indoc::indoc;
use pretty_assertions::assert_eq;

use super::{DEFAULT_MAX_DEPTH, ParseErrorKind, parse, parse_with_max_depth};
use crate::ast::{Literal, Node, NodeKind, SelectForm, Span};

/// Compact s-expression rendering, so tests don't spell out spans.
fn render(node: &Node) -> String {
    match &node.kind {
        NodeKind::ExpressionList(items) => {
            let items: Vec<_> = items.iter().map(render).collect();
            format!("[{}]", items.join("; "))
        }
        NodeKind::Assignment { names, value } => {
            format!("(= {} {})", names.join(" "), render(value))
        }
        NodeKind::Call { callee, args } => {
            let mut out = format!("(call {}", render(callee));
            for arg in args {
                out.push(' ');
                out.push_str(&render(arg));
            }
            out.push(')');
            out
        }
        NodeKind::Select { value, field, form } => match form {
            SelectForm::Normal => format!("(. {} {})", render(value), field),
            SelectForm::Infix => format!("(infix {} {})", field, render(value)),
            SelectForm::Prefix => format!("(prefix {} {})", field, render(value)),
        },
        NodeKind::Function { name, params, body } => {
            format!("(fn {} ({}) {})", name, params.join(" "), render(body))
        }
        NodeKind::Identifier(name) => name.clone(),
        NodeKind::Literal(Literal::Int(i)) => i.to_string(),
        NodeKind::Literal(Literal::Float(x)) => format!("{:?}", x),
        NodeKind::Literal(Literal::Str(s)) => format!("{:?}", s),
    }
}

fn parse_ok(source: &str) -> String {
    match parse(source) {
        Ok(node) => render(&node),
        Err(e) => panic!("failed to parse {:?}: {}", source, e),
    }
}

fn parse_err(source: &str) -> ParseErrorKind {
    match parse(source) {
        Ok(node) => panic!("expected an error, got {}", render(&node)),
        Err(e) => e.kind,
    }
}

#[test]
fn test_statements_and_operators() {
    let source = indoc! {"
        x = 2
        y = x + 3
        println(y)
    "};
    assert_eq!(
        parse_ok(source),
        "[(= x 2); (= y (call (infix + x) 3)); (call println y)]"
    );
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(
        parse_ok("1 + 2 * 3"),
        "[(call (infix + 1) (call (infix * 2) 3))]"
    );
    assert_eq!(
        parse_ok("(1 + 2) * 3"),
        "[(call (infix * (call (infix + 1) 2)) 3)]"
    );
    assert_eq!(
        parse_ok("10 - 4 - 3"),
        "[(call (infix - (call (infix - 10) 4)) 3)]"
    );
}

#[test]
fn test_logical_precedence() {
    assert_eq!(
        parse_ok("a || b && c == d"),
        "[(call (infix || a) (call (infix && b) (call (infix == c) d)))]"
    );
    assert_eq!(
        parse_ok("a < b == c >= d"),
        "[(call (infix == (call (infix < a) b)) (call (infix >= c) d))]"
    );
}

#[test]
fn test_prefix_binds_looser_than_postfix() {
    assert_eq!(
        parse_ok("-x.len()"),
        "[(call (prefix - (call (. x len))))]"
    );
    assert_eq!(parse_ok("!a && b"), "[(call (infix && (call (prefix ! a))) b)]");
    assert_eq!(parse_ok("1 - -2"), "[(call (infix - 1) (call (prefix - 2)))]");
}

#[test]
fn test_operator_field_select_is_normal_form() {
    assert_eq!(parse_ok("x.+(y)"), "[(call (. x +) y)]");
    assert_eq!(parse_ok("x.str()"), "[(call (. x str))]");
}

#[test]
fn test_chained_postfix() {
    assert_eq!(
        parse_ok("math.max(1, 2).str()"),
        "[(call (. (call (. math max) 1 2) str))]"
    );
    assert_eq!(parse_ok("f()()"), "[(call (call f))]");
    assert_eq!(parse_ok("1.len()"), "[(call (. 1 len))]");
}

#[test]
fn test_function_declarations() {
    assert_eq!(
        parse_ok("fn f(a, b): a + b"),
        "[(fn f (a b) [(call (infix + a) b)])]"
    );

    let source = indoc! {"
        fn g(): {
            x = 1

            x
        }
        g()
    "};
    assert_eq!(parse_ok(source), "[(fn g () [(= x 1); x]); (call g)]");
}

#[test]
fn test_keyword_prefix_is_an_identifier() {
    assert_eq!(parse_ok("fnord = 1"), "[(= fnord 1)]");
}

#[test]
fn test_assignment_forms() {
    assert_eq!(parse_ok("a, b = 1"), "[(= a b 1)]");
    assert_eq!(parse_ok("x == 3"), "[(call (infix == x) 3)]");
}

#[test]
fn test_separators_and_comments() {
    let source = indoc! {"
        # leading comment
        a = 1; b = 2  # trailing comment

        ;
        b
    "};
    assert_eq!(parse_ok(source), "[(= a 1); (= b 2); b]");
}

#[test]
fn test_empty_program() {
    assert_eq!(parse_ok(""), "[]");
    assert_eq!(parse_ok("\n\n  # nothing here\n"), "[]");
}

#[test]
fn test_literals() {
    assert_eq!(parse_ok("1.5"), "[1.5]");
    assert_eq!(parse_ok("2e3"), "[2000.0]");
    assert_eq!(
        parse_ok(r#""tab\there \"quoted\" back\\slash\n""#),
        r#"["tab\there \"quoted\" back\\slash\n"]"#
    );
}

#[test]
fn test_spans() {
    let program = parse("x = 2\ny").unwrap();
    let NodeKind::ExpressionList(items) = &program.kind else {
        panic!("root is not a list");
    };
    assert_eq!(program.span, Span::new(0, 7));
    assert_eq!(items[0].span, Span::new(0, 5));
    assert_eq!(items[1].span, Span::new(6, 7));
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(
        parse_err("1 +"),
        ParseErrorKind::UnexpectedToken { .. }
    ));
    assert!(matches!(
        parse_err("f(1,"),
        ParseErrorKind::UnexpectedToken { .. }
    ));
    assert_eq!(
        parse_err(r#""\q""#),
        ParseErrorKind::InvalidEscape { escape: 'q' }
    );
    assert_eq!(
        parse_err("99999999999999999999"),
        ParseErrorKind::InvalidNumber {
            text: "99999999999999999999".to_string()
        }
    );
}

#[test]
fn test_error_span_points_at_escape() {
    let error = parse(r#"s = "ab\q""#).unwrap_err();
    assert_eq!(error.span, Span::new(7, 9));
}

fn nested(depth: usize) -> String {
    format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn test_nesting_up_to_the_limit_parses() {
    let node = parse(&nested(DEFAULT_MAX_DEPTH)).unwrap();
    assert_eq!(render(&node), "[1]");
}

#[test]
fn test_nesting_past_the_limit_is_rejected() {
    let source = nested(10_000);
    let error = parse(&source).unwrap_err();
    assert_eq!(
        error.kind,
        ParseErrorKind::MaxDepthExceeded {
            depth: DEFAULT_MAX_DEPTH + 1,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    );
    assert_eq!(error.span, Span::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_DEPTH + 1));
}

#[test]
fn test_nesting_counts_blocks_and_prefix_runs() {
    let source = indoc! {"
        fn f(): {
            fn g(): {
                1
            }
            g()
        }
    "};
    assert!(parse_with_max_depth(source, 2).is_ok());
    assert_eq!(
        parse_with_max_depth(source, 1).unwrap_err().kind,
        ParseErrorKind::MaxDepthExceeded {
            depth: 2,
            max_depth: 1,
        }
    );

    assert_eq!(
        render(&parse_with_max_depth("- - 1", 2).unwrap()),
        "[(call (prefix - (call (prefix - 1))))]"
    );
    assert!(matches!(
        parse_with_max_depth("- - - 1", 2).unwrap_err().kind,
        ParseErrorKind::MaxDepthExceeded { depth: 3, .. }
    ));
    assert!(parse_with_max_depth("a = 1\nb = a - -a", 2).is_ok());
}

#[test]
fn test_nesting_ignores_strings_and_comments() {
    let source = "s = \"(((((\" # ((((((\ns";
    assert!(parse_with_max_depth(source, 1).is_ok());
}
