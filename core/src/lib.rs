//! Weft language core: parser, bytecode translator, block-dependency graph
//! and the graph evaluator.
//!
//! The pipeline is `parser::parse` → `compiler::translate` →
//! `graph::build` → `evaluator::evaluate_graph`; [`api::Engine`] wires the
//! stages together.

pub mod api;
pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod evaluator;
pub mod graph;
pub mod modules;
pub mod parser;
pub mod stack;
pub mod stdlib;
pub mod values;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
