//! Math Package
//!
//! Provides mathematical functions and constants for Weft.
//!
//! Constants: pi, e
//! Functions: sqrt, abs, floor, pow, min, max
//!
//! Functions accept ints and floats. `abs`, `min` and `max` keep integers
//! integral; `sqrt` always yields a float.

use crate::evaluator::{CallContext, ExecutionError, RuntimeError};
use crate::values::{Convention, Kind, Library, NativeFunction, Signature, Value};

const fn unary(name: &'static str, func: crate::values::NativeFn) -> NativeFunction {
    NativeFunction {
        name,
        convention: Convention::NORMAL,
        signature: Signature::exact(&[Kind::Number]),
        func,
    }
}

const fn binary(name: &'static str, func: crate::values::NativeFn) -> NativeFunction {
    NativeFunction {
        name,
        convention: Convention::NORMAL,
        signature: Signature::exact(&[Kind::Number, Kind::Number]),
        func,
    }
}

static SQRT: NativeFunction = unary("sqrt", math_sqrt);
static ABS: NativeFunction = unary("abs", math_abs);
static FLOOR: NativeFunction = unary("floor", math_floor);
static POW: NativeFunction = binary("pow", math_pow);
static MIN: NativeFunction = binary("min", math_min);
static MAX: NativeFunction = binary("max", math_max);

/// Build the `math` library.
pub fn build_math_package() -> Library {
    Library::new("math")
        .with("pi", core::f64::consts::PI)
        .with("e", core::f64::consts::E)
        .with("sqrt", Value::native(&SQRT))
        .with("abs", Value::native(&ABS))
        .with("floor", Value::native(&FLOOR))
        .with("pow", Value::native(&POW))
        .with("min", Value::native(&MIN))
        .with("max", Value::native(&MAX))
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(x) => *x,
        _ => f64::NAN,
    }
}

// ============================================================================
// Basic Operations
// ============================================================================

/// Square root
fn math_sqrt(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::Float(as_f64(&args[0]).sqrt()))
}

/// Absolute value; integers stay integers
fn math_abs(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match &args[0] {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::IntegerOverflow { operation: "abs" }.into()),
        other => Ok(Value::Float(as_f64(other).abs())),
    }
}

/// Floor function - largest integer <= x; integers are returned unchanged
fn math_floor(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        other => Ok(Value::Float(as_f64(other).floor())),
    }
}

/// Power; an int raised to a non-negative int stays an int
fn math_pow(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match (&args[0], &args[1]) {
        (Value::Int(base), Value::Int(exp)) if *exp >= 0 => u32::try_from(*exp)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::IntegerOverflow { operation: "pow" }.into()),
        (base, exp) => Ok(Value::Float(as_f64(base).powf(as_f64(exp)))),
    }
}

/// Minimum of two numbers
fn math_min(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(*a.min(b))),
        (a, b) => Ok(Value::Float(as_f64(a).min(as_f64(b)))),
    }
}

/// Maximum of two numbers
fn math_max(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(*a.max(b))),
        (a, b) => Ok(Value::Float(as_f64(a).max(as_f64(b)))),
    }
}
