//! Cycle breaking via delayed artifacts.
//!
//! When a traversal re-enters a type it is already building, it cannot
//! produce the real artifact yet; the real artifact is what the
//! traversal is in the middle of making. A [`DelayedValue`] stands in:
//! its factory immediately produces a *proxy* artifact that captures a
//! [`DelayedCell`] and reads it lazily, at use time. Completing the
//! cell with the real artifact makes every proxy handed out earlier
//! behave as that artifact from then on.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::Artifact;

/// Single-assignment slot a proxy artifact reads through.
///
/// Cheap to clone; all clones share the slot. Proxies must not read the
/// cell while constructing themselves, only when invoked.
pub struct DelayedCell<A> {
    slot: Arc<OnceLock<A>>,
}

impl<A> Clone for DelayedCell<A> {
    #[inline]
    fn clone(&self) -> Self {
        DelayedCell {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<A: Artifact> DelayedCell<A> {
    fn new() -> Self {
        DelayedCell {
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Whether the underlying artifact has been supplied.
    pub fn is_completed(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Read the underlying artifact.
    ///
    /// # Panics
    ///
    /// Panics if the cell has not been completed. A proxy reading its
    /// cell during a traversal means an artifact was *used* during
    /// generation rather than merely captured, which is a bug in the
    /// application's builder.
    pub fn get(&self) -> A {
        self.slot
            .get()
            .cloned()
            .unwrap_or_else(|| panic!("delayed artifact read before completion"))
    }

    /// Supply the underlying artifact.
    ///
    /// Completing twice is a generation bug; it is caught by debug
    /// assertions only, and release builds keep the first value.
    fn complete(&self, value: A) {
        let first = self.slot.set(value).is_ok();
        debug_assert!(first, "delayed artifact completed twice");
    }
}

/// A not-yet-available artifact plus the proxy standing in for it.
///
/// The factory runs in `new` and must return the proxy without reading
/// the cell. Once [`complete`](DelayedValue::complete) supplies the
/// real artifact, the proxy observably behaves as that artifact for the
/// rest of its life.
///
/// # Ownership
///
/// The proxy holds its cell strongly. A self-referential artifact (the
/// real artifact captures a proxy of itself) therefore forms a
/// reference cycle that keeps the cyclic cluster alive as long as any
/// handle to it lives; one small retained allocation per cyclic type
/// per cache.
pub struct DelayedValue<A: Artifact> {
    cell: DelayedCell<A>,
    proxy: A,
}

impl<A: Artifact> DelayedValue<A> {
    /// Run `factory` against a fresh cell and keep the proxy it builds.
    pub fn new(factory: impl FnOnce(&DelayedCell<A>) -> A) -> Self {
        let cell = DelayedCell::new();
        let proxy = factory(&cell);
        DelayedValue { cell, proxy }
    }

    /// The stand-in artifact. Safe to hand out and capture before
    /// completion; only *invoking* it early is an error.
    pub fn proxy(&self) -> A {
        self.proxy.clone()
    }

    /// Whether the real artifact has been supplied.
    pub fn is_completed(&self) -> bool {
        self.cell.is_completed()
    }

    /// Supply the real artifact.
    pub fn complete(&self, value: A) {
        self.cell.complete(value);
    }

    /// Read the real artifact.
    ///
    /// # Panics
    ///
    /// Panics if [`complete`](DelayedValue::complete) has not been
    /// called.
    pub fn result(&self) -> A {
        self.cell.get()
    }
}

impl<A: Artifact> fmt::Debug for DelayedValue<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_completed() {
            "completed"
        } else {
            "pending"
        };
        write!(f, "DelayedValue({state})")
    }
}
