//! Constant pool entries.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantKind {
    String,
    Integer,
    Float,
}

/// A literal stored in the constant pool.
///
/// Constants are compared and hashed by their encoded bytes, so two float
/// literals with the same bit pattern intern to the same entry.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant {
    pub kind: ConstantKind,
    pub bytes: Vec<u8>,
}

impl Constant {
    pub fn integer(value: i64) -> Self {
        Self {
            kind: ConstantKind::Integer,
            bytes: value.to_le_bytes().to_vec(),
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            kind: ConstantKind::Float,
            bytes: value.to_le_bytes().to_vec(),
        }
    }

    pub fn string(value: &str) -> Self {
        Self {
            kind: ConstantKind::String,
            bytes: value.as_bytes().to_vec(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.kind {
            ConstantKind::Integer => Some(i64::from_le_bytes(self.bytes.as_slice().try_into().ok()?)),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.kind {
            ConstantKind::Float => Some(f64::from_le_bytes(self.bytes.as_slice().try_into().ok()?)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.kind {
            ConstantKind::String => core::str::from_utf8(&self.bytes).ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConstantKind::Integer => match self.as_int() {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "<bad integer {:?}>", self.bytes),
            },
            ConstantKind::Float => match self.as_float() {
                Some(x) => write!(f, "{x:?}"),
                None => write!(f, "<bad float {:?}>", self.bytes),
            },
            ConstantKind::String => match self.as_str() {
                Some(s) => write!(f, "{s:?}"),
                None => write!(f, "<bad string {:?}>", self.bytes),
            },
        }
    }
}
