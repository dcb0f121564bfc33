use std::sync::Arc;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, trace};

use super::{Block, BlockGraph, Edges, FunctionBlock, InstructionList};
use crate::bytecode::{Bytecode, Instruction, ValueId};

/// Structural problems in an instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("PopFunction at {position} has no matching PushFunction")]
    UnbalancedPopFunction { position: usize },
    #[error("function opened at {position} is never closed")]
    UnterminatedFunction { position: usize },
    #[error("arguments pushed before {position} are not consumed by a call")]
    DanglingArguments { position: usize },
    #[error("instruction at {position} reads v{id} before it is produced")]
    ForwardReference { position: usize, id: ValueId },
}

/// Build the root block graph of a unit.
pub fn build(bytecode: &Bytecode) -> Result<BlockGraph, GraphError> {
    let mut builder = Builder {
        instructions: &bytecode.instructions,
        position: 0,
    };
    let (graph, _escaped) = builder.level(0, 0, None)?;
    debug!(
        nodes = graph.nodes.len(),
        instructions = bytecode.instructions.len(),
        "built block graph"
    );
    Ok(graph)
}

struct Builder<'a> {
    instructions: &'a [Instruction],
    position: usize,
}

/// Where a value id lives relative to the level being built.
enum Origin {
    /// Built-in or parameter: always available, no edge.
    Ambient,
    Local(usize),
    /// Defined in an enclosing level.
    Outer,
}

struct Level {
    first: ValueId,
    base: ValueId,
    function_count: usize,
    functions: Vec<FunctionBlock>,
    values: Vec<InstructionList>,
    edges: Edges,
    /// Sibling functions each function reads. These are not edges: a
    /// function block only captures the scope, so siblings may refer to
    /// each other.
    links: Vec<Vec<usize>>,
    /// Value blocks each function reads directly.
    captures: Vec<Vec<usize>>,
    escaped: Vec<ValueId>,
}

impl Level {
    fn origin(&self, id: ValueId, position: usize) -> Result<Origin, GraphError> {
        if id < 0 || (id >= self.first && id < self.base) {
            return Ok(Origin::Ambient);
        }
        if id < self.first {
            return Ok(Origin::Outer);
        }
        let index = (id - self.base) as usize;
        // Functions are hoisted, so only value blocks can be read too early.
        if index < self.function_count + self.values.len() {
            Ok(Origin::Local(index))
        } else {
            Err(GraphError::ForwardReference { position, id })
        }
    }

    /// Record that block `to` reads `id`.
    fn depend(&mut self, id: ValueId, to: usize, position: usize) -> Result<(), GraphError> {
        match self.origin(id, position)? {
            Origin::Ambient => {}
            Origin::Local(from) if from == to => {}
            Origin::Local(from) if to < self.function_count => {
                if from < self.function_count {
                    push_unique(&mut self.links[to], from);
                } else {
                    push_unique(&mut self.captures[to], from);
                    self.edge(from, to);
                }
            }
            Origin::Local(from) => self.edge(from, to),
            Origin::Outer => {
                if !self.escaped.contains(&id) {
                    self.escaped.push(id);
                }
            }
        }
        Ok(())
    }

    fn edge(&mut self, from: usize, to: usize) {
        push_unique(self.edges.entry(from).or_default(), to);
    }

    /// Functions reachable from `function` through sibling links,
    /// `function` excluded.
    fn linked(&self, function: usize) -> Vec<usize> {
        let mut seen = vec![false; self.function_count];
        seen[function] = true;
        let mut stack = vec![function];
        let mut reached = Vec::new();
        while let Some(current) = stack.pop() {
            for &next in &self.links[current] {
                if !seen[next] {
                    seen[next] = true;
                    reached.push(next);
                    stack.push(next);
                }
            }
        }
        reached
    }

    /// Give every function the dependencies of the siblings it can reach.
    ///
    /// Calling a function may run any sibling it reaches, so the function
    /// waits for their captured values, and every block that reads the
    /// function waits for those siblings to be written.
    fn propagate_links(&mut self) {
        let readers: Vec<Vec<usize>> = (0..self.function_count)
            .map(|function| self.edges.get(&function).cloned().unwrap_or_default())
            .collect();
        for function in 0..self.function_count {
            for sibling in self.linked(function) {
                for value in self.captures[sibling].clone() {
                    self.edge(value, function);
                }
                for &reader in &readers[function] {
                    self.edge(sibling, reader);
                }
            }
        }
    }

    fn next_value_index(&self) -> usize {
        self.function_count + self.values.len()
    }

    fn next_value_id(&self) -> ValueId {
        self.base + self.next_value_index() as ValueId
    }
}

fn push_unique(items: &mut Vec<usize>, item: usize) {
    if !items.contains(&item) {
        items.push(item);
    }
}

impl Builder<'_> {
    /// Count the functions declared directly at the level starting at the
    /// current position.
    fn count_functions(&self) -> usize {
        let mut depth = 0usize;
        let mut count = 0;
        for instruction in &self.instructions[self.position..] {
            match instruction {
                Instruction::PushFunction(_) => {
                    if depth == 0 {
                        count += 1;
                    }
                    depth += 1;
                }
                Instruction::PopFunction => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        count
    }

    /// Build one level. `opened_at` is the position of the `PushFunction`
    /// that opened it, or `None` for the root.
    ///
    /// Returns the graph and the ids it reads from enclosing levels.
    fn level(
        &mut self,
        first: ValueId,
        parameter_count: u32,
        opened_at: Option<usize>,
    ) -> Result<(BlockGraph, Vec<ValueId>), GraphError> {
        let function_count = self.count_functions();
        let mut level = Level {
            first,
            base: first + parameter_count as ValueId,
            function_count,
            functions: Vec::with_capacity(function_count),
            values: Vec::new(),
            edges: Edges::new(),
            links: vec![Vec::new(); function_count],
            captures: vec![Vec::new(); function_count],
            escaped: Vec::new(),
        };
        let mut pending: SmallVec<[Instruction; 2]> = SmallVec::new();
        let mut closed = false;

        trace!(first, parameter_count, function_count, "building level");

        while self.position < self.instructions.len() {
            let position = self.position;
            let instruction = self.instructions[position];
            self.position += 1;

            match instruction {
                Instruction::PopFunction => {
                    if !pending.is_empty() {
                        return Err(GraphError::DanglingArguments { position });
                    }
                    if opened_at.is_none() {
                        return Err(GraphError::UnbalancedPopFunction { position });
                    }
                    closed = true;
                    break;
                }
                Instruction::PushFunction(params) => {
                    if !pending.is_empty() {
                        return Err(GraphError::DanglingArguments { position });
                    }
                    let index = level.functions.len();
                    let value_id = level.base + index as ValueId;
                    let child_first = level.next_value_id();
                    let (graph, escaped) = self.level(child_first, params, Some(position))?;
                    for id in escaped {
                        level.depend(id, index, position)?;
                    }
                    level.functions.push(FunctionBlock {
                        value_id,
                        graph: Arc::new(graph),
                    });
                }
                Instruction::PushArgument(id) => {
                    level.depend(id, level.next_value_index(), position)?;
                    pending.push(instruction);
                }
                Instruction::ValueFromCall(callee) => {
                    level.depend(callee, level.next_value_index(), position)?;
                    pending.push(instruction);
                    level.values.push(InstructionList {
                        value_id: level.next_value_id(),
                        instructions: core::mem::take(&mut pending),
                    });
                }
                Instruction::ValueFromConstant(_)
                | Instruction::ValueFromStructValue { .. }
                | Instruction::ValueCopy(_) => {
                    if !pending.is_empty() {
                        return Err(GraphError::DanglingArguments { position });
                    }
                    if let Some(id) = instruction.value_operand() {
                        level.depend(id, level.next_value_index(), position)?;
                    }
                    let mut instructions = SmallVec::new();
                    instructions.push(instruction);
                    level.values.push(InstructionList {
                        value_id: level.next_value_id(),
                        instructions,
                    });
                }
            }
        }

        if !pending.is_empty() {
            return Err(GraphError::DanglingArguments {
                position: self.position,
            });
        }
        if let (Some(position), false) = (opened_at, closed) {
            return Err(GraphError::UnterminatedFunction { position });
        }

        level.propagate_links();

        let Level {
            functions,
            values,
            edges,
            escaped,
            ..
        } = level;
        let nodes = functions
            .into_iter()
            .map(Block::Function)
            .chain(values.into_iter().map(Block::Instructions))
            .collect();

        Ok((
            BlockGraph {
                first_value_id: first,
                parameter_count,
                nodes,
                edges,
            },
            escaped,
        ))
    }
}
