//! The Weft compilation engine.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::{EngineOptions, Error};
use crate::bytecode::{Bytecode, BytecodeCache, CacheError, Checksum, ValueId};
use crate::evaluator::{Runtime, Unit, evaluate_graph};
use crate::graph::{self, BlockGraph};
use crate::stdlib::Environment;
use crate::values::Value;
use crate::{compiler, parser};

/// The Weft compilation and execution engine.
///
/// The engine owns the built-in environment programs are compiled against
/// and, when enabled, the bytecode cache.
///
/// # Example
///
/// ```
/// use weft_core::api::{Engine, EngineOptions};
/// use weft_core::evaluator::Runtime;
///
/// let engine = Engine::new(EngineOptions::default());
/// let program = engine.compile("x = 2\ny = x + 3\nprintln(y)").unwrap();
///
/// let (runtime, output) = Runtime::captured(engine.options().execution.clone());
/// program.run(&runtime).unwrap();
/// assert_eq!(output.contents(), "5\n");
/// ```
pub struct Engine {
    environment: Arc<Environment>,
    cache: Option<BytecodeCache>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_environment(options, Environment::standard())
    }

    pub fn with_environment(options: EngineOptions, environment: Environment) -> Self {
        Self {
            environment: Arc::new(environment),
            cache: options.cache.open(),
            options,
        }
    }

    /// Register a host value as an extra built-in.
    ///
    /// Must happen before compiling programs that use it: built-in ids are
    /// fixed into the bytecode.
    pub fn register(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<ValueId, Error> {
        Ok(Arc::make_mut(&mut self.environment).register(name, value)?)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&BytecodeCache> {
        self.cache.as_ref()
    }

    /// A runtime writing to stdout with the engine's execution options.
    pub fn runtime(&self) -> Runtime {
        Runtime::new(self.options.execution.clone())
    }

    /// Parse and translate `source`, or reuse its cached bytecode.
    ///
    /// Host registrations change built-in ids, so the cache is only used
    /// while the environment is the standard one.
    #[instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn compile(&self, source: &str) -> Result<CompiledProgram, Error> {
        let checksum = Checksum::of_source(source);
        let cache = self.cache.as_ref().filter(|_| !self.environment.has_host_entries());

        let cached = match cache {
            Some(cache) => self.load_cached(cache, checksum)?,
            None => None,
        };
        let bytecode = match cached {
            Some(bytecode) => bytecode,
            None => {
                let root = parser::parse(source)?;
                let bytecode = compiler::translate(&root, &self.environment)?.with_checksum(checksum);
                if let Some(cache) = cache {
                    cache.store(&bytecode)?;
                }
                bytecode
            }
        };

        CompiledProgram::new(bytecode, self.environment.clone())
    }

    fn load_cached(&self, cache: &BytecodeCache, checksum: Checksum) -> Result<Option<Bytecode>, Error> {
        match cache.load(checksum) {
            Ok(hit) => {
                if hit.is_some() {
                    debug!(checksum = %checksum.to_hex(), "bytecode cache hit");
                }
                Ok(hit)
            }
            // A damaged entry is recompiled and overwritten.
            Err(CacheError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "ignoring corrupt cache entry");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// A translated program with its block graph, ready to run any number of
/// times.
#[derive(Debug)]
pub struct CompiledProgram {
    bytecode: Bytecode,
    graph: Arc<BlockGraph>,
    environment: Arc<Environment>,
}

impl CompiledProgram {
    /// Wrap bytecode compiled against `environment`. Fails when the
    /// instruction stream is not well nested.
    pub fn new(bytecode: Bytecode, environment: Arc<Environment>) -> Result<Self, Error> {
        let graph = graph::build(&bytecode).map_err(crate::evaluator::ExecutionError::from)?;
        Ok(Self {
            bytecode,
            graph: Arc::new(graph),
            environment,
        })
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    pub fn graph(&self) -> &BlockGraph {
        &self.graph
    }

    /// Evaluate the program; its value is the value of its last statement.
    pub fn run(&self, runtime: &Runtime) -> Result<Value, Error> {
        let unit = Arc::new(Unit::new(&self.bytecode, self.environment.clone()));
        let value = evaluate_graph(&runtime.context(), &unit, &self.graph, None, Vec::new())?;
        Ok(value)
    }
}
