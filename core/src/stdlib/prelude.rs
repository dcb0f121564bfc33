//! Prelude
//!
//! Names every program can use without importing anything.

use tracing::debug;

use crate::evaluator::{CallContext, ExecutionError, RuntimeError};
use crate::values::{Convention, Kind, NativeFunction, Signature, Value};

pub static PRINT: NativeFunction = NativeFunction {
    name: "print",
    convention: Convention::NORMAL,
    signature: Signature::variadic(Kind::Any),
    func: prelude_print,
};

pub static PRINTLN: NativeFunction = NativeFunction {
    name: "println",
    convention: Convention::NORMAL,
    signature: Signature::variadic(Kind::Any),
    func: prelude_println,
};

pub static IF: NativeFunction = NativeFunction {
    name: "if",
    convention: Convention::NORMAL,
    signature: Signature::exact(&[Kind::Bool, Kind::Function, Kind::Function]),
    func: prelude_if,
};

pub static STRUCT: NativeFunction = NativeFunction {
    name: "struct",
    convention: Convention::NORMAL,
    signature: Signature::exact(&[Kind::Function]),
    func: prelude_struct,
};

pub static TUPLE: NativeFunction = NativeFunction {
    name: "tuple",
    convention: Convention::NORMAL,
    signature: Signature::variadic(Kind::Any),
    func: prelude_tuple,
};

pub static IMPORT: NativeFunction = NativeFunction {
    name: "import",
    convention: Convention::NORMAL,
    signature: Signature::exact(&[Kind::Str]),
    func: prelude_import,
};

/// Prelude entries in table order.
pub fn values() -> Vec<(&'static str, Value)> {
    vec![
        ("true", Value::Bool(true)),
        ("false", Value::Bool(false)),
        ("unit", Value::Unit),
        ("print", Value::native(&PRINT)),
        ("println", Value::native(&PRINTLN)),
        ("if", Value::native(&IF)),
        ("struct", Value::native(&STRUCT)),
        ("tuple", Value::native(&TUPLE)),
        ("import", Value::native(&IMPORT)),
    ]
}

// ============================================================================
// Output
// ============================================================================

/// Arguments rendered with their `str` method, separated by spaces.
fn render(ctx: &CallContext<'_>, args: &[Value]) -> Result<String, ExecutionError> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(ctx.stringify(arg)?);
    }
    Ok(parts.join(" "))
}

fn prelude_print(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let text = render(ctx, args)?;
    ctx.runtime().write_output(&text)?;
    Ok(Value::Unit)
}

fn prelude_println(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let mut text = render(ctx, args)?;
    text.push('\n');
    ctx.runtime().write_output(&text)?;
    Ok(Value::Unit)
}

// ============================================================================
// Control and construction
// ============================================================================

/// Call exactly one of two zero-argument functions.
fn prelude_if(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let branch = match args[0] {
        Value::Bool(true) => &args[1],
        _ => &args[2],
    };
    ctx.call(branch, Vec::new())
}

fn prelude_struct(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match &args[0] {
        Value::Function(dispatch) => Ok(Value::Struct(dispatch.clone())),
        other => Err(RuntimeError::IncorrectBuiltInFunctionArgumentType {
            function: "struct".to_string(),
            index: 0,
            expected: Kind::Function,
            got: other.type_name(),
        }
        .into()),
    }
}

fn prelude_tuple(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::tuple(args.to_vec()))
}

// ============================================================================
// Modules
// ============================================================================

fn prelude_import(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let name = args[0].as_str().unwrap_or_default();
    let Some(modules) = ctx.runtime().modules() else {
        return Err(RuntimeError::ModuleUnavailable {
            module: name.to_string(),
        }
        .into());
    };
    debug!(module = name, "importing module");
    Ok(modules.load(name)?)
}
