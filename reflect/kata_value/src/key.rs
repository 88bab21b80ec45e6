//! Shape identity key.
//!
//! Provides the compact 32-bit identifier shapes are registered under.
//! Lives in this leaf crate (rather than `kata_shape`) because record
//! values carry the key of their declaring type.

use std::fmt;

/// Identity of a type within its shape provider.
///
/// Keys are allocated sequentially by a provider builder and are unique
/// only within that provider. A key minted by one provider is meaningless
/// in another; caches reject cross-provider use at the provider level,
/// not the key level.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeKey(u32);

impl TypeKey {
    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create from raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeKey(raw)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
