use core::fmt;
use std::sync::Arc;

use super::{BoundMethod, Function, Library, NativeFunction, methods};
use crate::bytecode::{Constant, ConstantKind};

/// Field name to value, as exposed by [`Value::definition`].
pub type Definition = hashbrown::HashMap<String, Value>;

/// A runtime value.
///
/// Cloning is cheap: aggregates and callables are reference counted.
#[derive(Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Tuple(Arc<[Value]>),
    Function(Function),
    /// A struct instance: selecting field `f` calls the dispatch function
    /// with the string `f`.
    Struct(Function),
    Library(Arc<Library>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Arc::from(items))
    }

    pub fn native(function: &'static NativeFunction) -> Self {
        Value::Function(Function::Native(function))
    }

    pub fn library(library: Library) -> Self {
        Value::Library(Arc::new(library))
    }

    /// Materialize a pool constant.
    pub fn from_constant(constant: &Constant) -> Option<Self> {
        match constant.kind {
            ConstantKind::Integer => constant.as_int().map(Value::Int),
            ConstantKind::Float => constant.as_float().map(Value::Float),
            ConstantKind::String => constant.as_str().map(Value::str),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::Function(_) => "function",
            Value::Struct(_) => "struct",
            Value::Library(_) => "library",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// A field from the value's static definition, without materializing
    /// the whole map.
    ///
    /// Struct instances have no static fields; theirs are only known by
    /// calling the dispatch function.
    pub fn static_field(&self, name: &str) -> Option<Value> {
        if let Value::Library(library) = self {
            return library.symbol(name).cloned();
        }
        methods::methods_for(self)
            .iter()
            .find(|method| method.name == name)
            .map(|method| self.bind(method))
    }

    /// The value's static fields: built-in methods bound to it, or a
    /// library's symbols.
    pub fn definition(&self) -> Definition {
        if let Value::Library(library) = self {
            return library
                .symbols()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect();
        }
        methods::methods_for(self)
            .iter()
            .map(|method| (method.name.to_string(), self.bind(method)))
            .collect()
    }

    pub(crate) fn bind(&self, method: &'static NativeFunction) -> Value {
        Value::Function(Function::Method(Arc::new(BoundMethod {
            receiver: self.clone(),
            method,
        })))
    }
}

/// Host-side identity/structural comparison. Functions compare by
/// identity; struct instances by their dispatch function.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Function(a), Value::Function(b)) | (Value::Struct(a), Value::Struct(b)) => {
                a.same(b)
            }
            (Value::Library(a), Value::Library(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

/// Plain rendering. Struct instances render opaquely here; their own `str`
/// needs an evaluation context (see [`super::stringify`]).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Function(function) => write!(f, "{function:?}"),
            Value::Struct(_) => write!(f, "<struct>"),
            Value::Library(library) => write!(f, "<library {}>", library.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            other => write!(f, "{other}"),
        }
    }
}
