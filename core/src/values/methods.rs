//! Built-in methods of primitive values.
//!
//! Every method receives its receiver as `args[0]`; the signature has
//! already been checked when the body runs.

use super::{Convention, Kind, NativeFn, NativeFunction, Signature, Value};
use crate::evaluator::{CallContext, ExecutionError, RuntimeError};

pub(crate) fn methods_for(value: &Value) -> &'static [NativeFunction] {
    match value {
        Value::Int(_) | Value::Float(_) => NUMBER_METHODS,
        Value::Bool(_) => BOOL_METHODS,
        Value::Str(_) => STR_METHODS,
        Value::Tuple(_) => TUPLE_METHODS,
        Value::Unit
        | Value::Function(_)
        | Value::Struct(_)
        | Value::Library(_) => &[],
    }
}

/// Every built-in method table, for translation-time field checks.
pub(crate) fn all_tables() -> [&'static [NativeFunction]; 4] {
    [NUMBER_METHODS, BOOL_METHODS, STR_METHODS, TUPLE_METHODS]
}

const fn infix(name: &'static str, params: &'static [Kind], func: NativeFn) -> NativeFunction {
    NativeFunction {
        name,
        convention: Convention::INFIX,
        signature: Signature::exact(params),
        func,
    }
}

const fn method(name: &'static str, params: &'static [Kind], func: NativeFn) -> NativeFunction {
    NativeFunction {
        name,
        convention: Convention::NORMAL,
        signature: Signature::exact(params),
        func,
    }
}

/// Receiver or argument of an unexpected kind. Only reachable when a
/// method is invoked outside its table.
fn unexpected(function: &str, index: usize, expected: Kind, got: &Value) -> ExecutionError {
    RuntimeError::IncorrectBuiltInFunctionArgumentType {
        function: function.to_string(),
        index,
        expected,
        got: got.type_name(),
    }
    .into()
}

// ============================================================================
// Numbers
// ============================================================================

static NUMBER_METHODS: &[NativeFunction] = &[
    infix("+", &[Kind::Number], number_add),
    NativeFunction {
        name: "-",
        convention: Convention::INFIX.union(Convention::PREFIX),
        signature: Signature::optional(&[Kind::Number], 0),
        func: number_sub,
    },
    infix("*", &[Kind::Number], number_mul),
    infix("/", &[Kind::Number], number_div),
    infix("%", &[Kind::Number], number_rem),
    infix("<", &[Kind::Number], number_lt),
    infix(">", &[Kind::Number], number_gt),
    infix("<=", &[Kind::Number], number_le),
    infix(">=", &[Kind::Number], number_ge),
];

enum Operands {
    Ints(i64, i64),
    Floats(f64, f64),
}

/// Integer operands stay integers; anything mixed with a float widens.
fn operands(name: &str, args: &[Value]) -> Result<Operands, ExecutionError> {
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Operands::Ints(*a, *b)),
        (Value::Int(a), Value::Float(b)) => Ok(Operands::Floats(*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Ok(Operands::Floats(*a, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Operands::Floats(*a, *b)),
        (Value::Int(_) | Value::Float(_), other) => Err(unexpected(name, 0, Kind::Number, other)),
        (other, _) => Err(unexpected(name, 0, Kind::Number, other)),
    }
}

fn overflow(operation: &'static str) -> ExecutionError {
    RuntimeError::IntegerOverflow { operation }.into()
}

fn number_add(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match operands("+", args)? {
        Operands::Ints(a, b) => a.checked_add(b).map(Value::Int).ok_or_else(|| overflow("+")),
        Operands::Floats(a, b) => Ok(Value::Float(a + b)),
    }
}

fn number_sub(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    if args.len() == 1 {
        return match &args[0] {
            Value::Int(a) => a.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
            Value::Float(a) => Ok(Value::Float(-a)),
            other => Err(unexpected("-", 0, Kind::Number, other)),
        };
    }
    match operands("-", args)? {
        Operands::Ints(a, b) => a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow("-")),
        Operands::Floats(a, b) => Ok(Value::Float(a - b)),
    }
}

fn number_mul(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match operands("*", args)? {
        Operands::Ints(a, b) => a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow("*")),
        Operands::Floats(a, b) => Ok(Value::Float(a * b)),
    }
}

fn number_div(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match operands("/", args)? {
        Operands::Ints(_, 0) => Err(RuntimeError::DivisionByZero.into()),
        Operands::Ints(a, b) => a.checked_div(b).map(Value::Int).ok_or_else(|| overflow("/")),
        Operands::Floats(_, b) if b == 0.0 => Err(RuntimeError::DivisionByZero.into()),
        Operands::Floats(a, b) => Ok(Value::Float(a / b)),
    }
}

fn number_rem(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match operands("%", args)? {
        Operands::Ints(_, 0) => Err(RuntimeError::DivisionByZero.into()),
        Operands::Ints(a, b) => a.checked_rem(b).map(Value::Int).ok_or_else(|| overflow("%")),
        Operands::Floats(_, b) if b == 0.0 => Err(RuntimeError::DivisionByZero.into()),
        Operands::Floats(a, b) => Ok(Value::Float(a % b)),
    }
}

fn compare(
    name: &str,
    args: &[Value],
    ints: fn(&i64, &i64) -> bool,
    floats: fn(&f64, &f64) -> bool,
) -> Result<Value, ExecutionError> {
    Ok(Value::Bool(match operands(name, args)? {
        Operands::Ints(a, b) => ints(&a, &b),
        Operands::Floats(a, b) => floats(&a, &b),
    }))
}

fn number_lt(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    compare("<", args, i64::lt, f64::lt)
}

fn number_gt(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    compare(">", args, i64::gt, f64::gt)
}

fn number_le(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    compare("<=", args, i64::le, f64::le)
}

fn number_ge(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    compare(">=", args, i64::ge, f64::ge)
}

// ============================================================================
// Booleans
// ============================================================================

static BOOL_METHODS: &[NativeFunction] = &[
    NativeFunction {
        name: "!",
        convention: Convention::PREFIX,
        signature: Signature::exact(&[]),
        func: bool_not,
    },
    infix("&&", &[Kind::Bool], bool_and),
    infix("||", &[Kind::Bool], bool_or),
];

fn bools(name: &str, args: &[Value]) -> Result<(bool, bool), ExecutionError> {
    match (&args[0], &args[1]) {
        (Value::Bool(a), Value::Bool(b)) => Ok((*a, *b)),
        (Value::Bool(_), other) => Err(unexpected(name, 0, Kind::Bool, other)),
        (other, _) => Err(unexpected(name, 0, Kind::Bool, other)),
    }
}

fn bool_not(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match &args[0] {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(unexpected("!", 0, Kind::Bool, other)),
    }
}

// Both operands are already evaluated; there is no short-circuiting.
fn bool_and(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let (a, b) = bools("&&", args)?;
    Ok(Value::Bool(a && b))
}

fn bool_or(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let (a, b) = bools("||", args)?;
    Ok(Value::Bool(a || b))
}

// ============================================================================
// Strings
// ============================================================================

static STR_METHODS: &[NativeFunction] = &[
    infix("+", &[Kind::Str], str_concat),
    method("len", &[], str_len),
];

fn str_concat(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match (&args[0], &args[1]) {
        (Value::Str(a), Value::Str(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::from(joined))
        }
        (Value::Str(_), other) => Err(unexpected("+", 0, Kind::Str, other)),
        (other, _) => Err(unexpected("+", 0, Kind::Str, other)),
    }
}

/// Length in characters.
fn str_len(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        other => Err(unexpected("len", 0, Kind::Str, other)),
    }
}

// ============================================================================
// Tuples
// ============================================================================

static TUPLE_METHODS: &[NativeFunction] = &[
    method("len", &[], tuple_len),
    method("get", &[Kind::Int], tuple_get),
];

fn tuple_len(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match &args[0] {
        Value::Tuple(items) => Ok(Value::Int(items.len() as i64)),
        other => Err(unexpected("len", 0, Kind::Tuple, other)),
    }
}

fn tuple_get(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    let (Value::Tuple(items), Value::Int(index)) = (&args[0], &args[1]) else {
        return Err(unexpected("get", 0, Kind::Int, &args[1]));
    };
    usize::try_from(*index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| {
            RuntimeError::IndexOutOfBounds {
                index: *index,
                len: items.len(),
            }
            .into()
        })
}
