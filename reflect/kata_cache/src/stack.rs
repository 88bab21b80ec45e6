//! Stack safety for deep shape recursion.
//!
//! Artifact builders recurse structurally through type graphs, and the
//! artifacts they produce recurse structurally through value graphs.
//! Neither recursion depth is under this crate's control, so both are
//! wrapped in [`ensure_sufficient_stack`], which grows the stack on
//! demand instead of overflowing.
//!
//! Native targets use the `stacker` crate; WASM is a passthrough since
//! it manages its own stack.

/// Minimum stack space to keep available (100KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// Wrap the recursive step, not the whole traversal: each wrapped call
/// checks the remaining stack and grows it when inside the red zone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
