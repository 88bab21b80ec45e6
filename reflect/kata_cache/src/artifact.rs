//! The artifact contract.

use std::sync::Arc;

/// A per-type product that can live in the caches.
///
/// Artifacts are handed out by clone and shared across threads, so they
/// must be cheap to clone. The caches never compare artifacts by
/// content: [`same_instance`](Artifact::same_instance) is the only
/// equality they know, and it is what commit validation and the
/// one-instance-per-type guarantee rest on.
pub trait Artifact: Clone + Send + Sync + 'static {
    /// Whether two clones denote the same underlying instance.
    fn same_instance(&self, other: &Self) -> bool;
}

/// Any shared pointer is an artifact; identity is the allocation.
///
/// Covers the common case of artifacts that are `Arc`'d closures or
/// `Arc`'d tables.
impl<T: ?Sized + Send + Sync + 'static> Artifact for Arc<T> {
    #[inline]
    fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity_and_rebuilds_do_not() {
        let a: Arc<str> = Arc::from("artifact");
        assert!(a.same_instance(&a.clone()));

        let b: Arc<str> = Arc::from("artifact");
        assert!(!a.same_instance(&b));
    }

    #[test]
    fn closure_artifacts_compare_by_allocation() {
        let f: Arc<dyn Fn() -> i64 + Send + Sync> = Arc::new(|| 1);
        let g = Arc::clone(&f);
        assert!(f.same_instance(&g));
        assert_eq!((*g)(), 1);
    }
}
