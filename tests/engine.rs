use indoc::indoc;
use pretty_assertions::assert_eq;

use weft::values::{Convention, Kind, Signature};
use weft::{
    CallContext, Engine, EngineOptions, Error, ExecutionError, ExecutionOptions, NativeFunction,
    Runtime, RuntimeError, Schedule, Value,
};

fn run(engine: &Engine, source: &str) -> (Result<Value, Error>, String) {
    let program = engine.compile(source).unwrap();
    let (runtime, output) = Runtime::captured(engine.options().execution.clone());
    let result = program.run(&runtime);
    (result, output.contents())
}

fn shout(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let text = args[0].as_str().unwrap_or_default();
    Ok(Value::from(text.to_uppercase()))
}

static SHOUT: NativeFunction = NativeFunction {
    name: "shout",
    convention: Convention::NORMAL,
    signature: Signature::exact(&[Kind::Str]),
    func: shout,
};

#[test]
fn prints_from_dependency_order() {
    let engine = Engine::new(EngineOptions::default());
    let (result, output) = run(&engine, "x = 2\ny = x + 3\nprintln(y)");
    assert_eq!(result.unwrap(), Value::Unit);
    assert_eq!(output, "5\n");
}

#[test]
fn host_values_are_builtins() {
    let mut engine = Engine::new(EngineOptions::default());
    engine.register("width", 6i64).unwrap();
    engine.register("shout", Value::native(&SHOUT)).unwrap();

    let source = indoc! {r#"
        fn area(h): width * h
        println(shout("area"), area(7))
    "#};
    let (result, output) = run(&engine, source);
    assert!(result.is_ok());
    assert_eq!(output, "AREA 42\n");

    assert!(matches!(
        engine.register("width", 1i64),
        Err(Error::Environment(_))
    ));
}

#[test]
fn program_runs_more_than_once() {
    let engine = Engine::new(EngineOptions::default());
    let program = engine
        .compile("fn sq(n): n * n\nsq(9) + sq(2)")
        .unwrap();
    for _ in 0..3 {
        let (runtime, _) = Runtime::captured(ExecutionOptions::default());
        assert_eq!(program.run(&runtime).unwrap(), Value::Int(85));
    }
}

#[test]
fn parallel_engine_agrees_with_sequential() {
    let source = indoc! {"
        fn fib(n): {
            fn small(): n
            fn big(): fib(n - 1) + fib(n - 2)
            if(n < 2, small, big)
        }
        a = fib(10)
        b = fib(12)
        tuple(a, b)
    "};
    let expected = Value::tuple(vec![Value::Int(55), Value::Int(144)]);

    let sequential = Engine::new(EngineOptions::default());
    assert_eq!(run(&sequential, source).0.unwrap(), expected);

    let mut options = EngineOptions::default();
    options.execution.schedule = Schedule::Parallel;
    let parallel = Engine::new(options);
    assert_eq!(run(&parallel, source).0.unwrap(), expected);
}

#[test]
fn errors_report_their_stage() {
    let engine = Engine::new(EngineOptions::default());

    let parse = engine.compile("x = = 1").unwrap_err();
    assert!(matches!(parse, Error::Parse(_)));
    assert!(parse.is_compilation());

    let translate = engine.compile("println(nope)").unwrap_err();
    assert!(matches!(translate, Error::Translate(_)));
    assert!(translate.is_compilation());

    let (runtime_error, _) = run(&engine, "1 / 0");
    let runtime_error = runtime_error.unwrap_err();
    assert!(!runtime_error.is_compilation());
    assert!(matches!(
        runtime_error,
        Error::Execution(ExecutionError::Runtime(RuntimeError::DivisionByZero))
    ));
}

#[test]
fn depth_limit_comes_from_engine_options() {
    let mut options = EngineOptions::default();
    options.execution.max_depth = 5;
    let engine = Engine::new(options);

    let (result, _) = run(&engine, "fn f(): f()\nf()");
    let diagnostic = result.unwrap_err().to_diagnostic();
    assert_eq!(diagnostic.code.as_deref(), Some("E002"));
    assert!(diagnostic.message.contains("maximum of 5"));
}

#[test]
fn deep_recursion_on_a_plain_thread_reports_the_limit() {
    let source = indoc! {"
        fn count(n): {
            fn done(): 0
            fn step(): count(n - 1) + 1
            if(n == 0, done, step)
        }
        count(400)
    "};
    for schedule in [Schedule::Sequential, Schedule::Parallel] {
        let mut options = EngineOptions::default();
        options.execution.schedule = schedule;
        let engine = Engine::new(options);

        let (result, _) = run(&engine, source);
        assert_eq!(result.unwrap(), Value::Int(400));

        let (result, _) = run(&engine, &source.replace("400", "5000"));
        let diagnostic = result.unwrap_err().to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("E002"));
    }
}
