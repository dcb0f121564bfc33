//! Stack growth for the recursive stages.
//!
//! Every closure call re-enters the evaluator, so calls run through
//! [`ensure_sufficient_stack`]. The grammar recurses once per nesting level
//! and runs on a stack of its own from [`with_stack`]. Recursion depth is
//! then bounded by the parser's nesting limit and the runtime's call depth
//! limit rather than by the thread stack the caller happens to have.

/// Run `f`, first moving to a fresh stack segment if the current one is
/// close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Space that must remain before a step runs (128 KiB).
    const RED_ZONE: usize = 128 * 1024;

    /// Size of each new segment (2 MiB).
    const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Run `f` on a freshly allocated stack of `size` bytes.
#[cfg(not(target_arch = "wasm32"))]
pub fn with_stack<R>(size: usize, f: impl FnOnce() -> R) -> R {
    stacker::grow(size, f)
}

#[cfg(target_arch = "wasm32")]
pub fn with_stack<R>(_size: usize, f: impl FnOnce() -> R) -> R {
    f()
}
