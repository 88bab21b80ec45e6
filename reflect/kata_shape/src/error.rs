//! Shape model errors.

use std::sync::Arc;

use kata_value::TypeKey;
use thiserror::Error;

/// Error raised by shape lookup or provider construction.
///
/// `Clone` because build errors flow into artifact caches, which may
/// memoize and replay them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// A key was resolved against a provider that never allocated it.
    #[error("unknown type {key} in provider `{provider}`")]
    UnknownType {
        /// The key that failed to resolve.
        key: TypeKey,
        /// Name of the provider consulted.
        provider: Arc<str>,
    },

    /// Two types were declared under the same name in one builder.
    #[error("duplicate type name `{name}`")]
    DuplicateType {
        /// The contested name.
        name: Arc<str>,
    },

    /// A key was reserved but never given a definition before `build()`.
    #[error("type `{name}` was reserved but never defined")]
    Undefined {
        /// Name the key was reserved under.
        name: Arc<str>,
    },

    /// A definition references a key the builder never allocated.
    #[error("type `{name}` references unknown key {referenced}")]
    Dangling {
        /// Name of the referencing type.
        name: Arc<str>,
        /// The key that does not exist.
        referenced: TypeKey,
    },

    /// `define` was called twice for the same key.
    #[error("type `{name}` ({key}) is already defined")]
    AlreadyDefined {
        /// Name the key was reserved under.
        name: Arc<str>,
        /// The doubly defined key.
        key: TypeKey,
    },

    /// The builder ran out of key space.
    #[error("provider `{provider}` is full ({count} types)")]
    TooManyTypes {
        /// Name of the overflowing provider.
        provider: Arc<str>,
        /// Number of types already allocated.
        count: usize,
    },
}
