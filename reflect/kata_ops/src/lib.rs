//! Shape-driven generic operations.
//!
//! Every module here compiles one closure artifact per type out of the
//! type's [`Shape`](kata_shape::Shape) and memoizes it in a
//! [`MultiProviderCache`](kata_cache::MultiProviderCache): deep cloning
//! ([`Cloner`]), structural equality ([`StructuralEq`]), seeded random
//! values ([`RandomGenerator`]), and reachable-node counting
//! ([`NodeCounter`]).
//!
//! The modules share one layout: a `ShapeVisitor` assembles the closure
//! for a single type and requests child closures through the generation
//! context (never by recursing into child shapes itself), a forwarding
//! proxy covers recursive types, and a small facade owns the cache. New
//! shape-driven operations should start from the same layout; `counter`
//! is the smallest worked example.

mod access;
mod cloner;
mod counter;
mod equality;
mod random;

pub use cloner::{CloneFn, Cloner};
pub use counter::{CountFn, NodeCounter};
pub use equality::{EqFn, StructuralEq};
pub use random::{RandomFn, RandomGenerator};
