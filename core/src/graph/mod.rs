//! Block dependency graphs.
//!
//! [`build`] reshapes a flat instruction stream into one [`BlockGraph`] per
//! lexical level; [`peel`] processes any node set in dependency order.

mod block;
mod builder;
pub mod peel;


pub use block::{Block, BlockGraph, FunctionBlock, InstructionList};
pub use builder::{GraphError, build};
pub use peel::{Peeled, Schedule, peel, peel_parallel, peel_with};

/// Dependency block index to the indices of the blocks that depend on it.
pub type Edges = hashbrown::HashMap<usize, Vec<usize>>;
