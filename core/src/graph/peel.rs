//! Topological "peeling" over a dependency graph.
//!
//! Nodes whose dependencies are all processed are ready; processing a node
//! releases its dependents. Whatever remains when no node is ready sits on
//! (or behind) a cycle.

use core::cmp::Reverse;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::collections::BinaryHeap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::warn;

use super::Edges;

/// Worker stack size of the parallel pool. Closure calls re-enter the
/// evaluator on the worker that runs them.
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

static POOL: Lazy<Option<rayon::ThreadPool>> = Lazy::new(|| {
    let built = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("weft-worker-{i}"))
        .stack_size(WORKER_STACK_SIZE)
        .build();
    match built {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(error = %e, "cannot build the worker pool, using the global rayon pool");
            None
        }
    }
});

/// How ready nodes are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// One node at a time on the calling thread, lowest ready index first.
    #[default]
    Sequential,
    /// Every ready node becomes a rayon task; the call returns once all
    /// spawned tasks have joined.
    Parallel,
}

/// Which nodes a peel managed to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peeled {
    processed: Vec<bool>,
}

impl Peeled {
    /// Whether every node was processed, i.e. the graph was acyclic.
    pub fn is_complete(&self) -> bool {
        self.processed.iter().all(|p| *p)
    }

    pub fn processed_count(&self) -> usize {
        self.processed.iter().filter(|p| **p).count()
    }

    pub fn was_processed(&self, index: usize) -> bool {
        self.processed.get(index).copied().unwrap_or(false)
    }

    pub fn unprocessed(&self) -> impl Iterator<Item = usize> + '_ {
        self.processed
            .iter()
            .enumerate()
            .filter(|(_, p)| !**p)
            .map(|(i, _)| i)
    }
}

fn in_degrees(node_count: usize, edges: &Edges) -> Vec<usize> {
    let mut degrees = vec![0usize; node_count];
    for dependents in edges.values() {
        for &dependent in dependents {
            if dependent < node_count {
                degrees[dependent] += 1;
            }
        }
    }
    degrees
}

/// Peel `nodes` on the calling thread.
///
/// Among ready nodes the lowest index runs first, so a graph whose edges
/// point from lower to higher indices is processed in index order.
pub fn peel<N, E>(
    nodes: &[N],
    edges: &Edges,
    mut visit: impl FnMut(usize, &N) -> Result<(), E>,
) -> Result<Peeled, E> {
    let mut degrees = in_degrees(nodes.len(), edges);
    let mut ready: BinaryHeap<Reverse<usize>> = degrees
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut processed = vec![false; nodes.len()];

    while let Some(Reverse(index)) = ready.pop() {
        visit(index, &nodes[index])?;
        processed[index] = true;

        for &dependent in edges.get(&index).into_iter().flatten() {
            if dependent >= nodes.len() {
                continue;
            }
            degrees[dependent] -= 1;
            if degrees[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    Ok(Peeled { processed })
}

struct ParallelPeel<'a, N, F, E> {
    nodes: &'a [N],
    edges: &'a Edges,
    visit: F,
    degrees: Vec<AtomicUsize>,
    processed: Vec<AtomicBool>,
    failed: AtomicBool,
    failure: Mutex<Option<E>>,
}

impl<'a, N, F, E> ParallelPeel<'a, N, F, E>
where
    N: Sync,
    F: Fn(usize, &N) -> Result<(), E> + Sync,
    E: Send,
{
    fn seed<'s>(&'s self, scope: &rayon::Scope<'s>, seeds: &[usize]) {
        for &seed in seeds {
            self.spawn(scope, seed);
        }
    }

    fn spawn<'s>(&'s self, scope: &rayon::Scope<'s>, index: usize) {
        scope.spawn(move |scope| self.run(scope, index));
    }

    fn run<'s>(&'s self, scope: &rayon::Scope<'s>, index: usize) {
        if self.failed.load(Ordering::Acquire) {
            return;
        }

        if let Err(e) = (self.visit)(index, &self.nodes[index]) {
            self.failed.store(true, Ordering::Release);
            self.failure.lock().get_or_insert(e);
            return;
        }
        self.processed[index].store(true, Ordering::Release);

        for &dependent in self.edges.get(&index).into_iter().flatten() {
            if dependent >= self.nodes.len() {
                continue;
            }
            // The task that releases the last dependency owns the dependent.
            if self.degrees[dependent].fetch_sub(1, Ordering::AcqRel) == 1 {
                self.spawn(scope, dependent);
            }
        }
    }
}

/// Peel `nodes` with every ready node running as its own rayon task on the
/// worker pool. Called from a pool worker, the scope runs on that worker.
///
/// The first error stops further scheduling; tasks already running finish.
pub fn peel_parallel<N, E>(
    nodes: &[N],
    edges: &Edges,
    visit: impl Fn(usize, &N) -> Result<(), E> + Sync,
) -> Result<Peeled, E>
where
    N: Sync,
    E: Send,
{
    let degrees = in_degrees(nodes.len(), edges);
    let seeds: Vec<usize> = degrees
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();

    let state = ParallelPeel {
        nodes,
        edges,
        visit,
        degrees: degrees.into_iter().map(AtomicUsize::new).collect(),
        processed: (0..nodes.len()).map(|_| AtomicBool::new(false)).collect(),
        failed: AtomicBool::new(false),
        failure: Mutex::new(None),
    };

    match POOL.as_ref() {
        Some(pool) => pool.scope(|scope| state.seed(scope, &seeds)),
        None => rayon::scope(|scope| state.seed(scope, &seeds)),
    }

    if let Some(e) = state.failure.into_inner() {
        return Err(e);
    }

    Ok(Peeled {
        processed: state
            .processed
            .into_iter()
            .map(AtomicBool::into_inner)
            .collect(),
    })
}

/// Peel with the given schedule.
pub fn peel_with<N, E>(
    schedule: Schedule,
    nodes: &[N],
    edges: &Edges,
    visit: impl Fn(usize, &N) -> Result<(), E> + Sync,
) -> Result<Peeled, E>
where
    N: Sync,
    E: Send,
{
    match schedule {
        Schedule::Sequential => peel(nodes, edges, visit),
        Schedule::Parallel => peel_parallel(nodes, edges, visit),
    }
}
