//! Configuration options for the Weft engine.

use std::path::PathBuf;

use crate::bytecode::BytecodeCache;
use crate::graph::Schedule;

/// Configuration options for program execution.
///
/// # Example
///
/// ```
/// use weft_core::api::ExecutionOptions;
/// use weft_core::graph::Schedule;
///
/// let options = ExecutionOptions {
///     max_depth: 500,
///     schedule: Schedule::Parallel,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Maximum closure call depth (for recursion protection).
    ///
    /// Default: 1000
    pub max_depth: usize,

    /// How ready blocks of a level are run.
    ///
    /// Default: [`Schedule::Sequential`]
    pub schedule: Schedule,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            schedule: Schedule::default(),
        }
    }
}

/// Where compiled bytecode is kept between runs.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    pub enabled: bool,

    /// Cache directory. `None` picks the platform cache directory.
    pub directory: Option<PathBuf>,
}

impl CacheOptions {
    /// The cache these options describe, if any.
    pub fn open(&self) -> Option<BytecodeCache> {
        if !self.enabled {
            return None;
        }
        match &self.directory {
            Some(directory) => Some(BytecodeCache::new(directory.clone())),
            None => BytecodeCache::platform_default(),
        }
    }
}

/// Configuration options for the Weft engine.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Defaults for runtimes created with [`crate::api::Engine::runtime`].
    pub execution: ExecutionOptions,

    pub cache: CacheOptions,
}
