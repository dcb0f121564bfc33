//! Unit tests for the evaluator.

use std::sync::Arc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::api::ExecutionOptions;
use crate::bytecode::{Bytecode, Constant, Instruction};
use crate::graph::Schedule;
use crate::modules::{ModuleClient, serve};
use crate::stdlib::Environment;
use crate::values::Value;
use crate::{compiler, parser};

struct Runner {
    options: ExecutionOptions,
    modules: Option<ModuleClient>,
}

impl Runner {
    fn new() -> Self {
        crate::test_utils::init_test_logging();
        Self {
            options: ExecutionOptions::default(),
            modules: None,
        }
    }

    fn parallel() -> Self {
        let mut runner = Self::new();
        runner.options.schedule = Schedule::Parallel;
        runner
    }

    fn with_max_depth(max_depth: usize) -> Self {
        let mut runner = Self::new();
        runner.options.max_depth = max_depth;
        runner
    }

    /// Evaluate `source`, returning the result and everything printed.
    fn run(self, source: &str) -> (Result<Value, ExecutionError>, String) {
        let environment = Arc::new(Environment::standard());
        let root = parser::parse(source).unwrap();
        let bytecode = compiler::translate(&root, &environment).unwrap();
        self.run_bytecode(&bytecode, environment)
    }

    fn run_bytecode(
        self,
        bytecode: &Bytecode,
        environment: Arc<Environment>,
    ) -> (Result<Value, ExecutionError>, String) {
        let (mut runtime, output) = Runtime::captured(self.options);
        if let Some(client) = self.modules {
            runtime = runtime.with_modules(client);
        }
        let result = evaluate(&runtime.context(), bytecode, environment);
        (result, output.contents())
    }

    fn value(self, source: &str) -> Value {
        match self.run(source).0 {
            Ok(value) => value,
            Err(e) => panic!("evaluation failed: {}", e),
        }
    }

    fn error(self, source: &str) -> ExecutionError {
        match self.run(source).0 {
            Ok(value) => panic!("expected an error, got {:?}", value),
            Err(e) => e,
        }
    }
}

fn raw(constants: Vec<Constant>, instructions: Vec<Instruction>) -> Bytecode {
    Bytecode {
        checksum: Default::default(),
        constants,
        instructions,
    }
}

#[test]
fn test_prints_sum() {
    let (result, output) = Runner::new().run("x = 2\ny = x + 3\nprintln(y)");
    assert_eq!(result, Ok(Value::Unit));
    assert_eq!(output, "5\n");
}

#[test]
fn test_print_joins_arguments() {
    let (_, output) = Runner::new().run(r#"print("a", 1, 2.5, tuple(true))"#);
    assert_eq!(output, "a 1 2.5 (true,)");
}

#[test]
fn test_program_value_is_last_statement() {
    assert_eq!(Runner::new().value("x = 4\nx * x"), Value::Int(16));
    assert_eq!(Runner::new().value("x = 4"), Value::Int(4));
    assert_eq!(Runner::new().value(""), Value::Unit);
}

#[test]
fn test_function_call() {
    let source = indoc! {"
        fn f(a, b): a + b
        f(2, 3)
    "};
    assert_eq!(Runner::new().value(source), Value::Int(5));
}

#[test]
fn test_function_arity_is_checked() {
    let source = indoc! {"
        fn f(a, b): a + b
        f(2)
    "};
    assert_eq!(
        Runner::new().error(source),
        RuntimeError::IncorrectCallArgumentCount {
            function: "closure v0".to_string(),
            expected: "2".to_string(),
            got: 1,
        }
        .into()
    );
}

#[test]
fn test_function_declared_later_is_callable() {
    let source = indoc! {"
        fn a(): b()
        fn b(): 1
        a()
    "};
    assert_eq!(Runner::new().value(source), Value::Int(1));
}

#[test]
fn test_closure_captures_enclosing_values() {
    let source = indoc! {"
        x = 10
        fn add(y): x + y
        add(5)
    "};
    assert_eq!(Runner::new().value(source), Value::Int(15));
}

#[test]
fn test_recursion_through_if() {
    let source = indoc! {"
        fn fact(n): {
            fn base(): 1
            fn step(): n * fact(n - 1)
            if(n <= 1, base, step)
        }
        fact(5)
    "};
    assert_eq!(Runner::new().value(source), Value::Int(120));
}

#[test]
fn test_each_activation_has_its_own_scope() {
    let source = indoc! {"
        fn double(n): n * 2
        a = double(3)
        b = double(10)
        tuple(a, b)
    "};
    assert_eq!(
        Runner::new().value(source),
        Value::tuple(vec![Value::Int(6), Value::Int(20)])
    );
}

#[test]
fn test_unbounded_recursion_overflows() {
    let source = indoc! {"
        fn f(): f()
        f()
    "};
    assert_eq!(
        Runner::with_max_depth(10).error(source),
        ResourceExceededError::StackOverflow {
            depth: 11,
            max_depth: 10,
        }
        .into()
    );
}

#[test]
fn test_parallel_schedule_matches_sequential() {
    let source = indoc! {"
        fn f(a, b): a * b
        x = f(2, 3)
        y = f(4, 5)
        z = f(x, y)
        println(z)
        z - x - y
    "};
    let (sequential, sequential_output) = Runner::new().run(source);
    let (parallel, parallel_output) = Runner::parallel().run(source);
    assert_eq!(sequential, Ok(Value::Int(94)));
    assert_eq!(parallel, sequential);
    assert_eq!(parallel_output, "120\n");
    assert_eq!(sequential_output, parallel_output);
}

#[test]
fn test_sequential_side_effects_follow_program_order() {
    let source = indoc! {r#"
        print("a")
        print("b")
        print("c")
    "#};
    let (_, output) = Runner::new().run(source);
    assert_eq!(output, "abc");
}

#[test]
fn test_mutual_recursion_between_siblings() {
    let source = indoc! {"
        fn even(n): {
            fn yes(): true
            fn no(): odd(n - 1)
            if(n == 0, yes, no)
        }
        fn odd(n): {
            fn yes(): false
            fn no(): even(n - 1)
            if(n == 0, yes, no)
        }
        tuple(even(10), even(7), odd(7))
    "};
    let expected = Value::tuple(vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)]);
    assert_eq!(Runner::new().value(source), expected);
    assert_eq!(Runner::parallel().value(source), expected);
}

#[test]
fn test_sibling_called_through_another_sees_captured_values() {
    let source = indoc! {"
        x = 21
        fn a(): b()
        fn b(): x * 2
        a()
    "};
    assert_eq!(Runner::new().value(source), Value::Int(42));
    assert_eq!(Runner::parallel().value(source), Value::Int(42));
}

/// Two closure calls per level: `count` and `step`.
const COUNT_DOWN: &str = indoc! {"
    fn count(n): {
        fn done(): 0
        fn step(): count(n - 1) + 1
        if(n == 0, done, step)
    }
    count(N)
"};

#[test]
fn test_recursion_close_to_the_depth_limit() {
    // 451 calls of `count`, 450 of `step` and the final `done`.
    let source = COUNT_DOWN.replace('N', "450");
    assert_eq!(Runner::with_max_depth(902).value(&source), Value::Int(450));

    let mut runner = Runner::parallel();
    runner.options.max_depth = 902;
    assert_eq!(runner.value(&source), Value::Int(450));

    assert_eq!(
        Runner::with_max_depth(901).error(&source),
        ResourceExceededError::StackOverflow {
            depth: 902,
            max_depth: 901,
        }
        .into()
    );
}

#[test]
fn test_default_depth_limit_stops_deep_recursion() {
    let source = COUNT_DOWN.replace('N', "100000");
    let max_depth = ExecutionOptions::default().max_depth;
    let expected: ExecutionError = ResourceExceededError::StackOverflow {
        depth: max_depth + 1,
        max_depth,
    }
    .into();
    assert_eq!(Runner::new().error(&source), expected);
    assert_eq!(Runner::parallel().error(&source), expected);
}

#[test]
fn test_call_activations_are_released() {
    let source = indoc! {"
        fn fact(n): {
            fn base(): 1
            fn step(): n * fact(n - 1)
            if(n <= 1, base, step)
        }
        fact
    "};
    let environment = Arc::new(Environment::standard());
    let root = parser::parse(source).unwrap();
    let bytecode = compiler::translate(&root, &environment).unwrap();
    let (runtime, _) = Runtime::captured(ExecutionOptions::default());
    let fact = evaluate(&runtime.context(), &bytecode, environment).unwrap();

    let Value::Function(crate::values::Function::Closure(closure)) = &fact else {
        panic!("expected a closure, got {:?}", fact);
    };
    let root_scope = Arc::downgrade(&closure.scope);
    assert_eq!(Arc::strong_count(&closure.scope), 1);

    let result = runtime.context().call(&fact, vec![Value::Int(6)]).unwrap();
    assert_eq!(result, Value::Int(720));
    // Every activation of `fact` held the root scope as its parent.
    assert_eq!(Arc::strong_count(&closure.scope), 1);

    drop(fact);
    assert!(root_scope.upgrade().is_none());
}

#[test]
fn test_struct_protocol() {
    let source = indoc! {r#"
        fn show(): "point"
        fn same(other): other == 1
        fn pick_show(): show
        fn pick_same(): same
        fn dispatch(name): if(name == "str", pick_show, pick_same)
        p = struct(dispatch)
        println(p)
        println(p.str())
        tuple(p == 1, p == 2)
    "#};
    let (result, output) = Runner::new().run(source);
    assert_eq!(output, "point\npoint\n");
    assert_eq!(
        result,
        Ok(Value::tuple(vec![Value::Bool(true), Value::Bool(false)]))
    );
}

#[test]
fn test_calling_a_struct_calls_its_dispatch() {
    let source = indoc! {r#"
        fn dispatch(name): name + "!"
        p = struct(dispatch)
        p("hey")
    "#};
    assert_eq!(Runner::new().value(source), Value::str("hey!"));
    assert_eq!(
        Runner::new().error(indoc! {"
            fn dispatch(name): name
            p = struct(dispatch)
            p(1, 2)
        "}),
        RuntimeError::IncorrectCallArgumentCount {
            function: "closure v0".to_string(),
            expected: "1".to_string(),
            got: 2,
        }
        .into()
    );
}

#[test]
fn test_tuple_methods() {
    let source = indoc! {"
        t = tuple(1, 2, 3)
        tuple(t.len(), t.get(1))
    "};
    assert_eq!(
        Runner::new().value(source),
        Value::tuple(vec![Value::Int(3), Value::Int(2)])
    );
    assert_eq!(
        Runner::new().error("t = tuple(1, 2, 3)\nt.get(5)"),
        RuntimeError::IndexOutOfBounds { index: 5, len: 3 }.into()
    );
}

#[test]
fn test_math_library() {
    assert_eq!(
        Runner::new().value("math.sqrt(16)"),
        Value::Float(4.0)
    );
    assert_eq!(
        Runner::new().error("math.tau"),
        RuntimeError::LibrarySymbolNotFound {
            library: "math".to_string(),
            symbol: "tau".to_string(),
        }
        .into()
    );
}

#[test]
fn test_runtime_errors() {
    assert_eq!(
        Runner::new().error("x = 1\nx()"),
        RuntimeError::NonFunctionCalled { type_name: "int" }.into()
    );
    assert_eq!(
        Runner::new().error("1 / 0"),
        RuntimeError::DivisionByZero.into()
    );
    assert_eq!(
        Runner::new().error(r#""abc".nope"#),
        RuntimeError::UnknownField {
            field: "nope".to_string(),
            type_name: "string",
        }
        .into()
    );
    assert_eq!(
        Runner::new().error("if(1, unit, unit)"),
        RuntimeError::IncorrectBuiltInFunctionArgumentType {
            function: "if".to_string(),
            index: 0,
            expected: crate::values::Kind::Bool,
            got: "int",
        }
        .into()
    );
}

#[test]
fn test_import_goes_through_module_channel() {
    let (client, receiver) = ModuleClient::channel();
    let loader = std::thread::spawn(move || {
        serve(&receiver, |name| match name {
            "answer" => Ok(Value::Int(42)),
            other => Err(format!("no module named {other}")),
        })
    });

    let mut runner = Runner::new();
    runner.modules = Some(client.clone());
    assert_eq!(
        runner.value("m = import(\"answer\")\nm + 1"),
        Value::Int(43)
    );

    let mut runner = Runner::new();
    runner.modules = Some(client);
    assert_eq!(
        runner.error("import(\"missing\")"),
        RuntimeError::ModuleLoad {
            module: "missing".to_string(),
            message: "no module named missing".to_string(),
        }
        .into()
    );

    loader.join().unwrap();
}

#[test]
fn test_import_without_loader() {
    assert_eq!(
        Runner::new().error("import(\"x\")"),
        RuntimeError::ModuleUnavailable {
            module: "x".to_string()
        }
        .into()
    );
}

#[test]
fn test_malformed_bytecode() {
    let environment = Arc::new(Environment::standard());

    let (result, _) = Runner::new().run_bytecode(&raw(Vec::new(), Vec::new()), environment.clone());
    assert_eq!(result, Err(RuntimeError::EmptyFunctionBlockGraph.into()));

    let empty_function = raw(
        Vec::new(),
        vec![
            Instruction::PushFunction(0),
            Instruction::PopFunction,
            Instruction::ValueFromCall(0),
        ],
    );
    let (result, _) = Runner::new().run_bytecode(&empty_function, environment.clone());
    assert_eq!(result, Err(RuntimeError::EmptyFunctionBlockGraph.into()));

    let numeric_field = raw(
        vec![Constant::integer(1)],
        vec![
            Instruction::ValueFromConstant(0),
            Instruction::ValueFromStructValue {
                value: 0,
                field: 0,
                form: crate::ast::SelectForm::Normal,
            },
        ],
    );
    let (result, _) = Runner::new().run_bytecode(&numeric_field, environment.clone());
    assert_eq!(
        result,
        Err(RuntimeError::NonStringFieldName { constant: 0 }.into())
    );

    let unbalanced = raw(Vec::new(), vec![Instruction::PopFunction]);
    let (result, _) = Runner::new().run_bytecode(&unbalanced, environment);
    assert!(matches!(
        result,
        Err(ExecutionError::Runtime(RuntimeError::MalformedBytecode { .. }))
    ));
}
