use weft::{Engine, EngineOptions, Runtime, Severity, render_error_to_string_no_color};

#[test]
fn unknown_value_is_labelled_in_source() {
    let engine = Engine::new(EngineOptions::default());
    let source = "x = 1\nprintln(y)";
    let error = engine.compile(source).unwrap_err();

    let diagnostic = error.to_diagnostic();
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.code.as_deref(), Some("T001"));
    assert_eq!(diagnostic.span.map(|span| span.0), Some(14..15));

    let rendered = render_error_to_string_no_color(&error, source);
    assert!(rendered.contains("[T001]"));
    assert!(rendered.contains("unknown value `y`"));
    assert!(rendered.contains("println(y)"));
}

#[test]
fn parse_error_at_end_of_input_renders() {
    let engine = Engine::new(EngineOptions::default());
    let source = "x = 1 +";
    let error = engine.compile(source).unwrap_err();

    let diagnostic = error.to_diagnostic();
    assert!(diagnostic.span.is_some());
    let rendered = render_error_to_string_no_color(&error, source);
    assert!(rendered.contains("x = 1 +"));
}

#[test]
fn runtime_errors_render_without_source() {
    let engine = Engine::new(EngineOptions::default());
    let source = "t = tuple(1)\nt.get(3)";
    let program = engine.compile(source).unwrap();
    let (runtime, _) = Runtime::captured(Default::default());
    let error = program.run(&runtime).unwrap_err();

    let rendered = render_error_to_string_no_color(&error, source);
    assert_eq!(
        rendered,
        "error[E001]: runtime error: index 3 out of bounds (length: 1)\n"
    );
}

#[test]
fn deep_nesting_is_a_parse_error() {
    let engine = Engine::new(EngineOptions::default());
    let source = format!("x = {}1{}", "(".repeat(5000), ")".repeat(5000));
    let error = engine.compile(&source).unwrap_err();

    let diagnostic = error.to_diagnostic();
    assert_eq!(diagnostic.code.as_deref(), Some("P004"));
    assert!(diagnostic.message.contains("exceeds maximum of 256 levels"));
}
