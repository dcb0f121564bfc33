//! Callable values: native functions, bound methods and bytecode closures.

use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use super::Value;
use crate::ast::SelectForm;
use crate::bytecode::ValueId;
use crate::evaluator::{CallContext, ExecutionError, RuntimeError, RuntimeScope, Unit};
use crate::graph::BlockGraph;

bitflags! {
    /// Syntactic forms a callable field may be selected in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Convention: u8 {
        const NORMAL = 0b001;
        const INFIX = 0b010;
        const PREFIX = 0b100;
    }
}

impl Convention {
    pub fn admits(self, form: SelectForm) -> bool {
        match form {
            SelectForm::Normal => self.contains(Convention::NORMAL),
            SelectForm::Infix => self.contains(Convention::INFIX),
            SelectForm::Prefix => self.contains(Convention::PREFIX),
        }
    }
}

/// Runtime shape a native function accepts for one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Any,
    Unit,
    Bool,
    Int,
    Float,
    /// Int or float.
    Number,
    Str,
    Tuple,
    Function,
}

impl Kind {
    pub fn admits(self, value: &Value) -> bool {
        match self {
            Kind::Any => true,
            Kind::Unit => matches!(value, Value::Unit),
            Kind::Bool => matches!(value, Value::Bool(_)),
            Kind::Int => matches!(value, Value::Int(_)),
            Kind::Float => matches!(value, Value::Float(_)),
            Kind::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            Kind::Str => matches!(value, Value::Str(_)),
            Kind::Tuple => matches!(value, Value::Tuple(_)),
            Kind::Function => matches!(value, Value::Function(_)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Any => "any value",
            Kind::Unit => "unit",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Number => "number",
            Kind::Str => "string",
            Kind::Tuple => "tuple",
            Kind::Function => "function",
        };
        f.write_str(name)
    }
}

/// Arguments a native function accepts. Method signatures exclude the
/// receiver.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub params: &'static [Kind],
    /// Leading parameters that must be supplied; the rest are optional.
    pub required: usize,
    /// Kind of any arguments past `params`, for variadic functions.
    pub rest: Option<Kind>,
}

impl Signature {
    pub const fn exact(params: &'static [Kind]) -> Self {
        Self {
            params,
            required: params.len(),
            rest: None,
        }
    }

    pub const fn optional(params: &'static [Kind], required: usize) -> Self {
        Self {
            params,
            required,
            rest: None,
        }
    }

    pub const fn variadic(kind: Kind) -> Self {
        Self {
            params: &[],
            required: 0,
            rest: Some(kind),
        }
    }

    fn arity(&self) -> String {
        match self.rest {
            Some(_) if self.required == 0 => "any number of".to_string(),
            Some(_) => format!("at least {}", self.required),
            None if self.required == self.params.len() => self.required.to_string(),
            None => format!("{} to {}", self.required, self.params.len()),
        }
    }

    /// Validate arity, then argument kinds.
    pub fn check(&self, function: &str, args: &[Value]) -> Result<(), RuntimeError> {
        let too_many = self.rest.is_none() && args.len() > self.params.len();
        if args.len() < self.required || too_many {
            return Err(RuntimeError::IncorrectCallArgumentCount {
                function: function.to_string(),
                expected: self.arity(),
                got: args.len(),
            });
        }

        for (index, arg) in args.iter().enumerate() {
            let Some(kind) = self.params.get(index).copied().or(self.rest) else {
                continue;
            };
            if !kind.admits(arg) {
                return Err(RuntimeError::IncorrectBuiltInFunctionArgumentType {
                    function: function.to_string(),
                    index,
                    expected: kind,
                    got: arg.type_name(),
                });
            }
        }
        Ok(())
    }
}

pub type NativeFn = fn(&CallContext<'_>, &[Value]) -> Result<Value, ExecutionError>;

/// A function implemented in Rust.
///
/// Methods receive their receiver as `args[0]`, ahead of the arguments
/// described by `signature`.
pub struct NativeFunction {
    pub name: &'static str,
    pub convention: Convention,
    pub signature: Signature,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("convention", &self.convention)
            .finish_non_exhaustive()
    }
}

/// A native method together with the value it was selected from.
pub struct BoundMethod {
    pub receiver: Value,
    pub method: &'static NativeFunction,
}

/// A function body paired with the scope it was declared in.
pub struct Closure {
    pub(crate) graph: Arc<BlockGraph>,
    pub(crate) unit: Arc<Unit>,
    pub(crate) scope: Arc<RuntimeScope>,
    pub(crate) value_id: ValueId,
}

impl Closure {
    pub fn parameter_count(&self) -> usize {
        self.graph.parameter_count as usize
    }
}

#[derive(Clone)]
pub enum Function {
    Native(&'static NativeFunction),
    Method(Arc<BoundMethod>),
    Closure(Arc<Closure>),
}

impl Function {
    pub fn convention(&self) -> Convention {
        match self {
            Function::Native(native) => native.convention,
            Function::Method(bound) => bound.method.convention,
            Function::Closure(_) => Convention::all(),
        }
    }

    /// Name used in error messages.
    pub fn name(&self) -> String {
        match self {
            Function::Native(native) => native.name.to_string(),
            Function::Method(bound) => {
                format!("{}.{}", bound.receiver.type_name(), bound.method.name)
            }
            Function::Closure(closure) => format!("closure v{}", closure.value_id),
        }
    }

    /// Identity comparison.
    pub fn same(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => core::ptr::eq(*a, *b),
            (Function::Method(a), Function::Method(b)) => Arc::ptr_eq(a, b),
            (Function::Closure(a), Function::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn call(&self, ctx: &CallContext<'_>, args: Vec<Value>) -> Result<Value, ExecutionError> {
        match self {
            Function::Native(native) => {
                native.signature.check(native.name, &args)?;
                (native.func)(ctx, &args)
            }
            Function::Method(bound) => {
                bound.method.signature.check(&self.name(), &args)?;
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(bound.receiver.clone());
                full.extend(args);
                (bound.method.func)(ctx, &full)
            }
            Function::Closure(closure) => ctx.call_closure(closure, args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}
