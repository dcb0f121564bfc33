use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{ExecutionError, ResourceExceededError, RuntimeError, interpreter};
use crate::api::ExecutionOptions;
use crate::ast::SelectForm;
use crate::modules::ModuleClient;
use crate::values::{self, Closure, Value};

/// Output written by `print`, kept in memory.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Host services shared by every evaluation: limits, the output sink and
/// the optional module loader channel.
pub struct Runtime {
    options: ExecutionOptions,
    output: Mutex<Box<dyn Write + Send>>,
    modules: Option<ModuleClient>,
}

impl Runtime {
    /// A runtime printing to stdout.
    pub fn new(options: ExecutionOptions) -> Self {
        Self {
            options,
            output: Mutex::new(Box::new(io::stdout())),
            modules: None,
        }
    }

    /// A runtime whose output is captured in memory.
    pub fn captured(options: ExecutionOptions) -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        let runtime = Self {
            options,
            output: Mutex::new(Box::new(captured.clone())),
            modules: None,
        };
        (runtime, captured)
    }

    pub fn with_modules(mut self, client: ModuleClient) -> Self {
        self.modules = Some(client);
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn modules(&self) -> Option<&ModuleClient> {
        self.modules.as_ref()
    }

    pub fn write_output(&self, text: &str) -> Result<(), RuntimeError> {
        let mut output = self.output.lock();
        output
            .write_all(text.as_bytes())
            .and_then(|()| output.flush())
            .map_err(|e| RuntimeError::Output {
                message: e.to_string(),
            })
    }

    /// Context for a top-level evaluation.
    pub fn context(&self) -> CallContext<'_> {
        CallContext {
            runtime: self,
            depth: 0,
        }
    }
}

/// What native functions see of the running program.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    runtime: &'a Runtime,
    depth: usize,
}

impl<'a> CallContext<'a> {
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context one closure call deeper.
    pub(crate) fn enter(&self) -> Result<CallContext<'a>, ExecutionError> {
        let depth = self.depth + 1;
        let max_depth = self.runtime.options.max_depth;
        if depth > max_depth {
            return Err(ResourceExceededError::StackOverflow { depth, max_depth }.into());
        }
        Ok(CallContext {
            runtime: self.runtime,
            depth,
        })
    }

    /// Call any function-capable value. A struct instance is called through
    /// its dispatch function.
    pub fn call(&self, callee: &Value, args: Vec<Value>) -> Result<Value, ExecutionError> {
        match callee {
            Value::Function(function) | Value::Struct(function) => function.call(self, args),
            other => Err(RuntimeError::NonFunctionCalled {
                type_name: other.type_name(),
            }
            .into()),
        }
    }

    pub(crate) fn call_closure(
        &self,
        closure: &Closure,
        args: Vec<Value>,
    ) -> Result<Value, ExecutionError> {
        interpreter::call_closure(self, closure, args)
    }

    pub fn resolve_field(
        &self,
        value: &Value,
        name: &str,
        form: SelectForm,
    ) -> Result<Value, ExecutionError> {
        values::resolve_field(self, value, name, form)
    }

    pub fn stringify(&self, value: &Value) -> Result<String, ExecutionError> {
        values::stringify(self, value)
    }

    pub fn equals(&self, a: &Value, b: &Value) -> Result<bool, ExecutionError> {
        values::equals(self, a, b)
    }
}
