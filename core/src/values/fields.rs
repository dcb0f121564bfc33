//! Field resolution and the universal methods every value carries.

use tracing::trace;

use super::{Convention, Kind, NativeFunction, Signature, Value, methods};
use crate::ast::SelectForm;
use crate::evaluator::{CallContext, ExecutionError, RuntimeError};

static UNIVERSAL_METHODS: &[NativeFunction] = &[
    NativeFunction {
        name: "str",
        convention: Convention::NORMAL,
        signature: Signature::exact(&[]),
        func: universal_str,
    },
    NativeFunction {
        name: "==",
        convention: Convention::INFIX,
        signature: Signature::exact(&[Kind::Any]),
        func: universal_eq,
    },
    NativeFunction {
        name: "!=",
        convention: Convention::INFIX,
        signature: Signature::exact(&[Kind::Any]),
        func: universal_ne,
    },
];

fn universal_str(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::from(stringify(ctx, &args[0])?))
}

fn universal_eq(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::Bool(equals(ctx, &args[0], &args[1])?))
}

fn universal_ne(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::Bool(!equals(ctx, &args[0], &args[1])?))
}

fn universal_field(value: &Value, name: &str) -> Option<Value> {
    UNIVERSAL_METHODS
        .iter()
        .find(|method| method.name == name)
        .map(|method| value.bind(method))
}

/// Calling convention of a field known without evaluating anything: a
/// built-in method of some primitive type, or a universal method.
///
/// Operator names share one convention across every type that defines
/// them.
pub fn static_convention(name: &str) -> Option<Convention> {
    methods::all_tables()
        .into_iter()
        .chain([UNIVERSAL_METHODS])
        .flat_map(|table| table.iter())
        .find(|method| method.name == name)
        .map(|method| method.convention)
}

/// Resolve `value.name` selected in `form`.
///
/// Struct instances answer through their dispatch function. Other values
/// consult their static definition, then the universal methods.
pub fn resolve_field(
    ctx: &CallContext<'_>,
    value: &Value,
    name: &str,
    form: SelectForm,
) -> Result<Value, ExecutionError> {
    let field = match value {
        Value::Struct(dispatch) => dispatch.call(ctx, vec![Value::str(name)])?,
        Value::Library(library) => value
            .static_field(name)
            .or_else(|| universal_field(value, name))
            .ok_or_else(|| RuntimeError::LibrarySymbolNotFound {
                library: library.name().to_string(),
                symbol: name.to_string(),
            })?,
        _ => value
            .static_field(name)
            .or_else(|| universal_field(value, name))
            .ok_or_else(|| RuntimeError::UnknownField {
                field: name.to_string(),
                type_name: value.type_name(),
            })?,
    };

    if let Value::Function(function) = &field {
        if !function.convention().admits(form) {
            return Err(RuntimeError::MethodCalledImproperly {
                field: name.to_string(),
                form,
            }
            .into());
        }
    }

    trace!(field = name, %form, receiver = value.type_name(), "resolved field");
    Ok(field)
}

fn call_universal(
    ctx: &CallContext<'_>,
    receiver: &Value,
    method: &'static str,
    form: SelectForm,
    args: Vec<Value>,
) -> Result<Value, ExecutionError> {
    let field = resolve_field(ctx, receiver, method, form)?;
    ctx.call(&field, args)
}

/// Render a value as its `str` method would.
pub fn stringify(ctx: &CallContext<'_>, value: &Value) -> Result<String, ExecutionError> {
    match value {
        Value::Struct(_) => match call_universal(ctx, value, "str", SelectForm::Normal, vec![])? {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(RuntimeError::UniversalMethodReturnedIncorrectValue {
                method: "str",
                expected: "string",
                got: other.type_name(),
            }
            .into()),
        },
        Value::Tuple(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items.iter() {
                rendered.push(stringify(ctx, item)?);
            }
            let trailing = if items.len() == 1 { "," } else { "" };
            Ok(format!("({}{})", rendered.join(", "), trailing))
        }
        other => Ok(other.to_string()),
    }
}

/// Language-level equality.
///
/// Tuples compare element-wise, struct instances through their own `==`,
/// everything else by representation. Values of different types are never
/// equal.
pub fn equals(ctx: &CallContext<'_>, a: &Value, b: &Value) -> Result<bool, ExecutionError> {
    match (a, b) {
        (Value::Struct(_), _) => {
            match call_universal(ctx, a, "==", SelectForm::Infix, vec![b.clone()])? {
                Value::Bool(result) => Ok(result),
                other => Err(RuntimeError::UniversalMethodReturnedIncorrectValue {
                    method: "==",
                    expected: "bool",
                    got: other.type_name(),
                }
                .into()),
            }
        }
        (Value::Tuple(xs), Value::Tuple(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys.iter()) {
                if !equals(ctx, x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Function(f), Value::Function(g)) => Ok(f.same(g)),
        _ => Ok(a == b),
    }
}

/// Whether a name could be a user-defined field selected with `.name`.
pub fn is_identifier_shaped(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}
