//! Bytecode representation shared by the translator, the graph builder and
//! the on-disk cache.
//!
//! ## Value identifiers
//!
//! Non-negative identifiers name values produced inside a scope and grow in
//! program order. Negative identifiers name built-in values (see
//! [`crate::stdlib::Environment`]) and are never allocated dynamically.

mod cache;
mod code;
mod constant;
mod instruction;


pub use cache::{BytecodeCache, CacheError};
pub use code::{Bytecode, Checksum, CodecError};
pub use constant::{Constant, ConstantKind};
pub use instruction::Instruction;

/// Identifier of a value within its defining scope; negative for built-ins.
pub type ValueId = i32;

/// Index into a unit's constant pool.
pub type ConstantId = u32;

/// Whether an identifier names a built-in value.
pub fn is_builtin(id: ValueId) -> bool {
    id < 0
}
