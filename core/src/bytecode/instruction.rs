//! Weft instruction set.
//!
//! Instructions do not manipulate a stack. Every value-producing
//! instruction implicitly defines the next value identifier of the scope it
//! appears in, and operands refer to earlier values by identifier:
//!
//! ```text
//! x = 2            ValueFromConstant(#0)           -> v0
//! y = x + 3        ValueFromStructValue(v0, #1, infix) -> v1   (x.+)
//!                  ValueFromConstant(#2)           -> v2
//!                  PushArgument(v2)
//!                  ValueFromCall(v1)               -> v3
//! ```
//!
//! `PushFunction`/`PopFunction` bracket a function body; the body's
//! identifiers continue from the enclosing scope's counter, with the
//! parameters first.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{ConstantId, ValueId};
use crate::ast::SelectForm;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// Append a value to the pending argument buffer of the next call.
    PushArgument(ValueId),

    /// Call the value with the pending arguments; defines a new value.
    ValueFromCall(ValueId),

    /// Materialize a pool constant; defines a new value.
    ValueFromConstant(ConstantId),

    /// Resolve a field of a value; defines a new value.
    ///
    /// `field` names a string constant holding the field name.
    ValueFromStructValue {
        value: ValueId,
        field: ConstantId,
        form: SelectForm,
    },

    /// Open a function body taking the given number of parameters.
    PushFunction(u32),

    /// Close the innermost function body.
    PopFunction,

    /// Re-publish an existing value under a new local identifier.
    ValueCopy(ValueId),
}

impl Instruction {
    /// Whether executing this instruction defines a new value identifier.
    pub fn produces_value(&self) -> bool {
        matches!(
            self,
            Instruction::ValueFromCall(_)
                | Instruction::ValueFromConstant(_)
                | Instruction::ValueFromStructValue { .. }
                | Instruction::ValueCopy(_)
        )
    }

    /// The value identifier this instruction reads, if any.
    ///
    /// Every instruction names at most one value.
    pub fn value_operand(&self) -> Option<ValueId> {
        match *self {
            Instruction::PushArgument(id)
            | Instruction::ValueFromCall(id)
            | Instruction::ValueCopy(id)
            | Instruction::ValueFromStructValue { value: id, .. } => Some(id),
            Instruction::ValueFromConstant(_)
            | Instruction::PushFunction(_)
            | Instruction::PopFunction => None,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushArgument(id) => write!(f, "PushArgument(v{id})"),
            Instruction::ValueFromCall(id) => write!(f, "ValueFromCall(v{id})"),
            Instruction::ValueFromConstant(id) => write!(f, "ValueFromConstant(#{id})"),
            Instruction::ValueFromStructValue { value, field, form } => {
                write!(f, "ValueFromStructValue(v{value}, #{field}, {form})")
            }
            Instruction::PushFunction(params) => write!(f, "PushFunction({params})"),
            Instruction::PopFunction => write!(f, "PopFunction"),
            Instruction::ValueCopy(id) => write!(f, "ValueCopy(v{id})"),
        }
    }
}
