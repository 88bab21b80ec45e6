//! Artifact caching for shape traversals.
//!
//! Applications built on `kata_shape` produce one *artifact* per type
//! (a cloner closure, a comparer closure, a generator, ...). Artifacts
//! for related types reference each other, type graphs recurse, and the
//! same artifact is wanted from many threads at once. This crate is the
//! machinery that makes all of that safe, in three layers:
//!
//! # Architecture
//!
//! - [`DelayedValue`] breaks cycles. When a traversal re-enters a type
//!   it is already building, it hands out a proxy artifact that forwards
//!   to the real one once it exists.
//! - [`TypeGenerationContext`] owns one traversal. It is single-threaded
//!   by construction (`&mut` API, no locks), memoizes per-type results,
//!   materializes delayed values on re-entry, and finally publishes the
//!   whole batch into its parent cache with one atomic, validated
//!   commit.
//! - [`TypeCache`] memoizes artifacts per provider across threads, and
//!   [`MultiProviderCache`] keys independent `TypeCache`s by provider
//!   identity without keeping dead providers alive.
//!
//! Builds run outside any lock: concurrent traversals of the same type
//! race freely, the first commit wins, and losers adopt the winner's
//! artifacts instead of publishing their own. Every caller therefore
//! sees exactly one artifact instance per (provider, type).
//!
//! # Error Handling
//!
//! Failures split along the line drawn by [`BuildError`]: application
//! builder failures are `Result`s (optionally memoized and replayed),
//! while contract violations (reading an incomplete delayed value,
//! committing an unfinished context, mixing providers) panic at the
//! offending call site.

mod artifact;
mod cache;
mod config;
mod context;
mod delayed;
mod error;
mod multi;
mod stack;


pub use artifact::Artifact;
pub use cache::TypeCache;
pub use config::{ArtifactBuilder, BuilderConfig, DelayedFactory};
pub use context::TypeGenerationContext;
pub use delayed::{DelayedCell, DelayedValue};
pub use error::BuildError;
pub use multi::MultiProviderCache;
pub use stack::ensure_sufficient_stack;
