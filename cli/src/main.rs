use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::Parser;
use crossbeam::channel::Receiver;
use miette::{Diagnostic, Result};
use thiserror::Error;
use tracing::{debug, error};
use weft::{
    CacheOptions, Engine, EngineOptions, ExecutionOptions, ModuleClient, ModuleRequest, Schedule,
    Value, render_error,
};

const MODULE_EXTENSION: &str = "wf";

/// Weft - a dataflow scripting language
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(about = "Run Weft programs", long_about = None)]
struct Args {
    /// Program file (reads from stdin if not provided)
    file: Option<PathBuf>,

    /// Run independent blocks in parallel
    #[arg(long)]
    parallel: bool,

    /// Maximum closure call depth
    #[arg(long, default_value_t = 1000)]
    max_depth: usize,

    /// Do not read or write the bytecode cache
    #[arg(long)]
    no_cache: bool,

    /// Bytecode cache directory (defaults to the platform cache directory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Print the translated bytecode (for debugging)
    #[arg(long)]
    debug_bytecode: bool,

    /// Print the block graph (for debugging)
    #[arg(long)]
    debug_graph: bool,
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("cannot read {}", path.display())]
    #[diagnostic(code(weft::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read program from stdin")]
    #[diagnostic(code(weft::stdin))]
    Stdin(#[source] std::io::Error),

    #[error("cannot start the module loader thread")]
    #[diagnostic(code(weft::thread))]
    Thread(#[source] std::io::Error),
}

impl Args {
    fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            execution: ExecutionOptions {
                max_depth: self.max_depth,
                schedule: if self.parallel {
                    Schedule::Parallel
                } else {
                    Schedule::Sequential
                },
            },
            cache: CacheOptions {
                enabled: !self.no_cache,
                directory: self.cache_dir.clone(),
            },
        }
    }
}

/// Program text and the directory imports resolve against.
fn read_program(file: Option<&Path>) -> Result<(String, PathBuf), CliError> {
    match file {
        Some(path) => {
            let source = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((source, root))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(CliError::Stdin)?;
            Ok((source, PathBuf::from(".")))
        }
    }
}

fn module_path(root: &Path, name: &str) -> Result<PathBuf, String> {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if !plain {
        return Err(format!("`{name}` is not a valid module name"));
    }
    Ok(root.join(name).with_extension(MODULE_EXTENSION))
}

fn load_module(engine: &Engine, client: &ModuleClient, root: &Path, name: &str) -> Result<Value, String> {
    let path = module_path(root, name)?;
    debug!(module = name, path = %path.display(), "loading module");

    let source = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let program = engine.compile(&source).map_err(|e| {
        render_error(&e, &source);
        format!("{} does not compile", path.display())
    })?;

    let runtime = engine.runtime().with_modules(client.clone());
    program.run(&runtime).map_err(|e| e.to_string())
}

/// Serve imports for the lifetime of the process. Every request runs on its
/// own thread so a module may import further modules.
fn serve_modules(engine: Arc<Engine>, client: ModuleClient, receiver: Receiver<ModuleRequest>, root: PathBuf) {
    for request in receiver.iter() {
        let engine = engine.clone();
        let client = client.clone();
        let root = root.clone();
        let spawned = thread::Builder::new()
            .name(format!("weft-module-{}", request.name))
            .spawn(move || {
                let result = load_module(&engine, &client, &root, &request.name);
                request.respond(result);
            });
        // The dropped request is reported to the importer as a failed load.
        if let Err(e) = spawned {
            error!(error = %e, "cannot start module thread");
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control log level, default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let (source, root) = read_program(args.file.as_deref())?;
    let engine = Arc::new(Engine::new(args.engine_options()));

    let program = match engine.compile(&source) {
        Ok(program) => program,
        Err(e) => {
            render_error(&e, &source);
            std::process::exit(1);
        }
    };

    if args.debug_bytecode {
        println!("=== Bytecode ===");
        println!("{:?}", program.bytecode());
        println!();
    }

    if args.debug_graph {
        println!("=== Block Graph ===");
        println!("{:?}", program.graph());
        println!();
    }

    let (client, receiver) = ModuleClient::channel();
    {
        let engine = engine.clone();
        let client = client.clone();
        thread::Builder::new()
            .name("weft-modules".to_string())
            .spawn(move || serve_modules(engine, client, receiver, root))
            .map_err(CliError::Thread)?;
    }

    let runtime = engine.runtime().with_modules(client);
    if let Err(e) = program.run(&runtime) {
        render_error(&e, &source);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names_stay_in_the_root() {
        let root = Path::new("scripts");
        assert_eq!(
            module_path(root, "util").unwrap(),
            PathBuf::from("scripts/util.wf")
        );
        assert!(module_path(root, "../secret").is_err());
        assert!(module_path(root, "a/b").is_err());
        assert!(module_path(root, "").is_err());
    }

    #[test]
    fn test_args_map_to_engine_options() {
        let args = Args::parse_from(["weft", "--parallel", "--max-depth", "50", "--no-cache", "main.wf"]);
        let options = args.engine_options();
        assert_eq!(options.execution.max_depth, 50);
        assert_eq!(options.execution.schedule, Schedule::Parallel);
        assert!(!options.cache.enabled);
        assert_eq!(args.file, Some(PathBuf::from("main.wf")));
    }
}
