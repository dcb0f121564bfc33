//! Runtime scopes.
//!
//! Every activation of a block graph gets a [`RuntimeScope`] linked to the
//! scope its graph was declared in. Closures hold an `Arc` of their
//! declaring scope, so an activation lives exactly as long as something
//! can still read from it.
//!
//! A closure stored in the scope it captures would keep that scope alive
//! forever. Such a slot keeps only the closure's body; the closure is
//! rebuilt around the scope whenever the slot is read.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::{RuntimeError, Unit};
use crate::bytecode::ValueId;
use crate::graph::BlockGraph;
use crate::values::{Closure, Function, Value};

enum Slot {
    Value(Value),
    /// A closure over the scope holding the slot.
    Local {
        graph: Arc<BlockGraph>,
        unit: Arc<Unit>,
        value_id: ValueId,
    },
}

/// Write-once value slots for one activation, covering
/// `first_value_id .. first_value_id + slots`.
pub struct RuntimeScope {
    parent: Option<Arc<RuntimeScope>>,
    first_value_id: ValueId,
    values: Box<[OnceCell<Slot>]>,
}

impl RuntimeScope {
    pub fn new(parent: Option<Arc<RuntimeScope>>, first_value_id: ValueId, slots: usize) -> Self {
        Self {
            parent,
            first_value_id,
            values: (0..slots).map(|_| OnceCell::new()).collect(),
        }
    }

    pub fn parent(&self) -> Option<&Arc<RuntimeScope>> {
        self.parent.as_ref()
    }

    pub fn first_value_id(&self) -> ValueId {
        self.first_value_id
    }

    fn slot(&self, id: ValueId) -> Option<&OnceCell<Slot>> {
        let offset = usize::try_from(id.checked_sub(self.first_value_id)?).ok()?;
        self.values.get(offset)
    }

    /// Read a slot of this scope.
    pub fn get(self: &Arc<Self>, id: ValueId) -> Option<Value> {
        match self.slot(id)?.get()? {
            Slot::Value(value) => Some(value.clone()),
            Slot::Local {
                graph,
                unit,
                value_id,
            } => Some(Value::Function(Function::Closure(Arc::new(Closure {
                graph: graph.clone(),
                unit: unit.clone(),
                scope: self.clone(),
                value_id: *value_id,
            })))),
        }
    }

    /// Write a slot. Each slot is written exactly once.
    pub fn set(&self, id: ValueId, value: Value) -> Result<(), RuntimeError> {
        let slot = self.slot(id).ok_or_else(|| RuntimeError::MalformedBytecode {
            reason: format!("v{id} is outside its scope"),
        })?;
        let stored = match value {
            Value::Function(Function::Closure(closure)) if core::ptr::eq(&*closure.scope, self) => {
                Slot::Local {
                    graph: closure.graph.clone(),
                    unit: closure.unit.clone(),
                    value_id: closure.value_id,
                }
            }
            value => Slot::Value(value),
        };
        slot.set(stored).map_err(|_| RuntimeError::MalformedBytecode {
            reason: format!("v{id} written twice"),
        })
    }

    /// Find `id` starting here, moving outward while the scope starts above
    /// it.
    pub fn lookup(self: &Arc<Self>, id: ValueId) -> Result<Value, RuntimeError> {
        let mut scope = self;
        while scope.first_value_id > id {
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return Err(RuntimeError::UnresolvedValue { id }),
            }
        }
        scope.get(id).ok_or(RuntimeError::UnresolvedValue { id })
    }
}
