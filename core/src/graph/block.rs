use core::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::Edges;
use crate::bytecode::{Instruction, ValueId};

/// Zero or more `PushArgument`s followed by exactly one value-producing
/// instruction.
#[derive(Clone, PartialEq, Eq)]
pub struct InstructionList {
    pub value_id: ValueId,
    pub instructions: SmallVec<[Instruction; 2]>,
}

/// A function body nested in its parent's graph.
#[derive(Clone, PartialEq, Eq)]
pub struct FunctionBlock {
    pub value_id: ValueId,
    pub graph: Arc<BlockGraph>,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Block {
    Instructions(InstructionList),
    Function(FunctionBlock),
}

impl Block {
    pub fn value_id(&self) -> ValueId {
        match self {
            Block::Instructions(list) => list.value_id,
            Block::Function(function) => function.value_id,
        }
    }
}

/// Blocks of one lexical level and the dependencies between them.
///
/// Block `i` produces value `first_value_id + parameter_count + i`; function
/// blocks come first.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BlockGraph {
    pub first_value_id: ValueId,
    pub parameter_count: u32,
    pub nodes: Vec<Block>,
    pub edges: Edges,
}

impl BlockGraph {
    /// First value id produced by a block (the one after the parameters).
    pub fn local_base(&self) -> ValueId {
        self.first_value_id + self.parameter_count as ValueId
    }

    /// Number of value slots a runtime scope for this graph needs.
    pub fn slot_count(&self) -> usize {
        self.parameter_count as usize + self.nodes.len()
    }

    pub fn is_parameter(&self, id: ValueId) -> bool {
        id >= self.first_value_id && id < self.local_base()
    }

    /// Value id of the last block, which is the graph's result.
    pub fn result_value_id(&self) -> Option<ValueId> {
        self.nodes.last().map(Block::value_id)
    }

    pub fn dependents(&self, index: usize) -> &[usize] {
        self.edges.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    fn fmt_level(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(
            f,
            "graph(first: v{}, params: {}) {{",
            self.first_value_id, self.parameter_count
        )?;
        for (index, block) in self.nodes.iter().enumerate() {
            write!(f, "{:width$}[{}] v{} = ", "", index, block.value_id(), width = indent + 2)?;
            match block {
                Block::Instructions(list) => {
                    let listing: Vec<String> =
                        list.instructions.iter().map(|i| format!("{i:?}")).collect();
                    write!(f, "{}", listing.join("; "))?;
                }
                Block::Function(function) => function.graph.fmt_level(f, indent + 2)?,
            }
            let dependents = self.dependents(index);
            if !dependents.is_empty() {
                write!(f, "  -> {dependents:?}")?;
            }
            writeln!(f)?;
        }
        write!(f, "{:indent$}}}", "")
    }
}

impl fmt::Debug for BlockGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_level(f, 0)
    }
}
