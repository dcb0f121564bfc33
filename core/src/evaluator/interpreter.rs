use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::{CallContext, ExecutionError, RuntimeError, RuntimeScope};
use crate::bytecode::{Bytecode, ConstantId, Instruction, ValueId, is_builtin};
use crate::graph::{self, Block, BlockGraph, InstructionList};
use crate::stack::ensure_sufficient_stack;
use crate::stdlib::Environment;
use crate::values::{Closure, Function, Value};

/// Everything one compiled program shares at run time: its constants and
/// the built-ins it was compiled against.
pub struct Unit {
    constants: Vec<Option<Value>>,
    environment: Arc<Environment>,
}

impl Unit {
    pub fn new(bytecode: &Bytecode, environment: Arc<Environment>) -> Self {
        Self {
            constants: bytecode.constants.iter().map(Value::from_constant).collect(),
            environment,
        }
    }

    fn constant(&self, id: ConstantId) -> Result<Value, RuntimeError> {
        match self.constants.get(id as usize) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(RuntimeError::MalformedBytecode {
                reason: format!("constant #{id} cannot be decoded"),
            }),
            None => Err(RuntimeError::MalformedBytecode {
                reason: format!("constant #{id} is out of range"),
            }),
        }
    }

    fn field_name(&self, id: ConstantId) -> Result<Arc<str>, RuntimeError> {
        match self.constant(id)? {
            Value::Str(name) => Ok(name),
            _ => Err(RuntimeError::NonStringFieldName { constant: id }),
        }
    }

    fn lookup(&self, scope: &Arc<RuntimeScope>, id: ValueId) -> Result<Value, RuntimeError> {
        if is_builtin(id) {
            return self
                .environment
                .get(id)
                .cloned()
                .ok_or(RuntimeError::UnresolvedValue { id });
        }
        scope.lookup(id)
    }
}

/// Build the block graph of `bytecode` and evaluate it.
pub fn evaluate(
    ctx: &CallContext<'_>,
    bytecode: &Bytecode,
    environment: Arc<Environment>,
) -> Result<Value, ExecutionError> {
    let graph = Arc::new(graph::build(bytecode)?);
    let unit = Arc::new(Unit::new(bytecode, environment));
    evaluate_graph(ctx, &unit, &graph, None, Vec::new())
}

pub(crate) fn call_closure(
    ctx: &CallContext<'_>,
    closure: &Closure,
    args: Vec<Value>,
) -> Result<Value, ExecutionError> {
    if args.len() != closure.parameter_count() {
        return Err(RuntimeError::IncorrectCallArgumentCount {
            function: format!("closure v{}", closure.value_id),
            expected: closure.parameter_count().to_string(),
            got: args.len(),
        }
        .into());
    }
    let ctx = ctx.enter()?;
    trace!(closure = closure.value_id, depth = ctx.depth(), "calling closure");
    ensure_sufficient_stack(|| {
        evaluate_graph(
            &ctx,
            &closure.unit,
            &closure.graph,
            Some(closure.scope.clone()),
            args,
        )
    })
}

/// Evaluate one level: allocate its scope, bind the arguments to the
/// parameter ids, then peel the blocks.
///
/// The result is the value of the last block.
pub fn evaluate_graph(
    ctx: &CallContext<'_>,
    unit: &Arc<Unit>,
    graph: &BlockGraph,
    parent: Option<Arc<RuntimeScope>>,
    args: Vec<Value>,
) -> Result<Value, ExecutionError> {
    let Some(result_id) = graph.result_value_id() else {
        return Err(RuntimeError::EmptyFunctionBlockGraph.into());
    };

    let scope = Arc::new(RuntimeScope::new(
        parent,
        graph.first_value_id,
        graph.slot_count(),
    ));
    for (offset, arg) in args.into_iter().enumerate() {
        scope.set(graph.first_value_id + offset as ValueId, arg)?;
    }

    let visit = |_index: usize, block: &Block| -> Result<(), ExecutionError> {
        let value = match block {
            Block::Function(function) => Value::Function(Function::Closure(Arc::new(Closure {
                graph: function.graph.clone(),
                unit: unit.clone(),
                scope: scope.clone(),
                value_id: function.value_id,
            }))),
            Block::Instructions(list) => execute(ctx, unit, &scope, list)?,
        };
        scope.set(block.value_id(), value)?;
        Ok(())
    };

    let peeled = graph::peel_with(
        ctx.runtime().options().schedule,
        &graph.nodes,
        &graph.edges,
        visit,
    )?;
    if !peeled.is_complete() {
        let unprocessed = graph.nodes.len() - peeled.processed_count();
        debug!(unprocessed, "block graph has a dependency cycle");
        return Err(RuntimeError::ValueCycle { unprocessed }.into());
    }

    scope
        .get(result_id)
        .ok_or_else(|| RuntimeError::UnresolvedValue { id: result_id }.into())
}

/// Run one instruction list and return the value it produces.
fn execute(
    ctx: &CallContext<'_>,
    unit: &Unit,
    scope: &Arc<RuntimeScope>,
    list: &InstructionList,
) -> Result<Value, ExecutionError> {
    let mut args: SmallVec<[Value; 4]> = SmallVec::new();

    for instruction in &list.instructions {
        match *instruction {
            Instruction::PushArgument(id) => args.push(unit.lookup(scope, id)?),
            Instruction::ValueFromCall(id) => {
                let callee = unit.lookup(scope, id)?;
                return ctx.call(&callee, args.into_vec());
            }
            Instruction::ValueFromConstant(id) => return Ok(unit.constant(id)?),
            Instruction::ValueFromStructValue { value, field, form } => {
                let receiver = unit.lookup(scope, value)?;
                let name = unit.field_name(field)?;
                return ctx.resolve_field(&receiver, &name, form);
            }
            Instruction::ValueCopy(id) => return Ok(unit.lookup(scope, id)?),
            Instruction::PushFunction(_) | Instruction::PopFunction => break,
        }
    }

    Err(RuntimeError::MalformedBytecode {
        reason: format!("block for v{} produces no value", list.value_id),
    }
    .into())
}
