//! Shape model for the Kata reflection toolkit.
//!
//! A *shape* is the structural description of a type: what kind of thing
//! it is (object, enum, nullable, enumerable, dictionary) and how to get
//! at its parts. Shapes are owned by a [`ShapeProvider`], an immutable
//! universe of type descriptions built once through
//! [`ShapeProviderBuilder`] and then shared freely across threads.
//!
//! # Architecture
//!
//! - [`TypeKey`] identifies a type within its provider (re-exported from
//!   `kata_value`, where record values carry it).
//! - [`ShapeKind`] is the closed set of five structural kinds. There is
//!   no sixth: leaf types are property-less objects with a
//!   [`ScalarKind`] hint, so applications stay total over the enum.
//! - [`ShapeVisitor`] is the dispatch protocol: one required method per
//!   kind, driven by [`Shape::accept`]. Adding a kind is a breaking
//!   change for every visitor.
//!
//! # Thread Safety
//!
//! Providers and shapes are immutable after `build()`; all handles are
//! cheap `Arc` clones and `Send + Sync`.

mod builder;
mod error;
mod kind;
mod provider;
mod visit;

pub use kata_value::TypeKey;

pub use builder::ShapeProviderBuilder;
pub use error::ShapeError;
pub use kind::{
    record_ctor, DictionaryShape, EnumCase, EnumShape, EnumerableShape, FieldGetter, InstanceCtor,
    NullableShape, ObjectShape, PropertyShape, ScalarKind, ShapeKind,
};
pub use provider::{ProviderId, Shape, ShapeProvider, WeakShapeProvider};
pub use visit::ShapeVisitor;
