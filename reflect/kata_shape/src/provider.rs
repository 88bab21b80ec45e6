//! Shape providers and shape handles.
//!
//! A provider is the immutable, reference-identified universe of shapes
//! produced by one `ShapeProviderBuilder::build()` call. Identity is the
//! allocation, not the contents: two providers built from identical
//! definitions are distinct, and everything keyed by a provider (most
//! importantly the artifact caches) inherits that distinction.

use std::fmt;
use std::sync::{Arc, Weak};

use kata_value::TypeKey;

use crate::{ShapeError, ShapeKind};

/// One type's stored description.
pub(crate) struct ShapeData {
    pub(crate) name: Arc<str>,
    pub(crate) kind: ShapeKind,
}

/// Provider internals. Shapes index into `shapes` by key; keys are
/// allocated densely from zero by the builder, so the vector position is
/// the key.
pub(crate) struct ProviderCore {
    pub(crate) name: Arc<str>,
    pub(crate) shapes: Vec<ShapeData>,
}

/// Stable identity token of a provider.
///
/// Derived from the provider's allocation; valid as a hash key for as
/// long as any strong or weak handle exists. Identity can be reused by
/// the allocator once a provider is fully dropped, which is why
/// weak-keyed registries must check [`WeakShapeProvider::upgrade`]
/// before trusting a slot found under an id.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(usize);

impl fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderId({:#x})", self.0)
    }
}

impl ProviderId {
    pub(crate) fn of(core: &Arc<ProviderCore>) -> Self {
        ProviderId(Arc::as_ptr(core) as usize)
    }
}

/// Immutable universe of type shapes.
///
/// Cloning shares the universe; [`ShapeProvider::id`] is the same for
/// every clone and different for every independently built provider.
#[derive(Clone)]
pub struct ShapeProvider {
    core: Arc<ProviderCore>,
}

impl ShapeProvider {
    pub(crate) fn from_core(core: Arc<ProviderCore>) -> Self {
        ShapeProvider { core }
    }

    /// This provider's identity token.
    #[inline]
    pub fn id(&self) -> ProviderId {
        ProviderId::of(&self.core)
    }

    /// Provider name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Number of types in this provider.
    pub fn len(&self) -> usize {
        self.core.shapes.len()
    }

    /// Whether this provider holds no types.
    pub fn is_empty(&self) -> bool {
        self.core.shapes.is_empty()
    }

    /// Look up the shape registered under `key`.
    pub fn shape(&self, key: TypeKey) -> Option<Shape> {
        let index = key.raw() as usize;
        if index < self.core.shapes.len() {
            Some(Shape {
                core: Arc::clone(&self.core),
                key,
            })
        } else {
            None
        }
    }

    /// Look up the shape registered under `key`, or report which
    /// provider was missing it.
    pub fn resolve(&self, key: TypeKey) -> Result<Shape, ShapeError> {
        self.shape(key).ok_or_else(|| ShapeError::UnknownType {
            key,
            provider: Arc::clone(&self.core.name),
        })
    }

    /// Downgrade to a weak handle that does not keep the provider alive.
    pub fn downgrade(&self) -> WeakShapeProvider {
        WeakShapeProvider {
            core: Arc::downgrade(&self.core),
        }
    }

    /// Whether two handles refer to the same provider.
    #[inline]
    pub fn same_provider(&self, other: &ShapeProvider) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl fmt::Debug for ShapeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShapeProvider(`{}`, {} types, {:?})",
            self.core.name,
            self.core.shapes.len(),
            self.id()
        )
    }
}

/// Weak handle to a provider.
///
/// Used by registries that must not keep dead providers' caches alive.
#[derive(Clone)]
pub struct WeakShapeProvider {
    core: Weak<ProviderCore>,
}

impl WeakShapeProvider {
    /// Recover a strong handle, if the provider is still alive.
    pub fn upgrade(&self) -> Option<ShapeProvider> {
        self.core.upgrade().map(|core| ShapeProvider { core })
    }
}

/// Handle to one type's shape.
///
/// Holds a strong reference to its provider: a shape in hand keeps its
/// whole universe (and thus every child it can [`resolve`](Shape::resolve))
/// queryable.
#[derive(Clone)]
pub struct Shape {
    core: Arc<ProviderCore>,
    key: TypeKey,
}

impl Shape {
    fn data(&self) -> &ShapeData {
        // In-bounds by construction: shapes are only minted by provider
        // lookups that check the key.
        &self.core.shapes[self.key.raw() as usize]
    }

    /// This type's key within its provider.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Declared type name.
    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// Declared type name as a shared string.
    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.data().name)
    }

    /// Structural kind and payload.
    pub fn kind(&self) -> &ShapeKind {
        &self.data().kind
    }

    /// The provider that owns this shape.
    pub fn provider(&self) -> ShapeProvider {
        ShapeProvider {
            core: Arc::clone(&self.core),
        }
    }

    /// Identity of the owning provider.
    #[inline]
    pub fn provider_id(&self) -> ProviderId {
        ProviderId::of(&self.core)
    }

    /// Resolve a child key against the owning provider.
    ///
    /// This is how traversals move from a shape to its element,
    /// property, key, or value types without threading the provider
    /// separately.
    pub fn resolve(&self, key: TypeKey) -> Result<Shape, ShapeError> {
        let index = key.raw() as usize;
        if index < self.core.shapes.len() {
            Ok(Shape {
                core: Arc::clone(&self.core),
                key,
            })
        } else {
            Err(ShapeError::UnknownType {
                key,
                provider: Arc::clone(&self.core.name),
            })
        }
    }
}

impl PartialEq for Shape {
    /// Two handles are equal when they name the same key in the same
    /// provider.
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Arc::ptr_eq(&self.core, &other.core)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shape(`{}` {} {})",
            self.name(),
            self.key,
            self.kind().kind_name()
        )
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::{ScalarKind, ShapeProviderBuilder};

    fn tiny_provider() -> ShapeProvider {
        let mut builder = ShapeProviderBuilder::new("tiny");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        builder.enumerable("ints", int).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn lookup_in_and_out_of_bounds() {
        let provider = tiny_provider();
        assert_eq!(provider.len(), 2);
        assert!(provider.shape(TypeKey::from_raw(1)).is_some());
        assert!(provider.shape(TypeKey::from_raw(2)).is_none());

        let err = provider.resolve(TypeKey::from_raw(9)).unwrap_err();
        assert_eq!(
            err,
            ShapeError::UnknownType {
                key: TypeKey::from_raw(9),
                provider: "tiny".into(),
            }
        );
    }

    #[test]
    fn clones_share_identity_and_rebuilds_do_not() {
        let provider = tiny_provider();
        assert_eq!(provider.id(), provider.clone().id());
        assert!(provider.same_provider(&provider.clone()));

        let other = tiny_provider();
        assert_ne!(provider.id(), other.id());
        assert!(!provider.same_provider(&other));
    }

    #[test]
    fn shape_keeps_provider_alive() {
        let shape = {
            let provider = tiny_provider();
            provider.shape(TypeKey::from_raw(0)).unwrap()
        };
        // The provider handle is gone, but the shape still resolves
        // through it.
        assert_eq!(shape.name(), "int");
        assert_eq!(shape.provider().name(), "tiny");
    }

    #[test]
    fn weak_handle_dies_with_provider() {
        let provider = tiny_provider();
        let weak = provider.downgrade();
        assert!(weak.upgrade().is_some());
        drop(provider);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn resolve_child_through_shape() {
        let provider = tiny_provider();
        let list = provider.shape(TypeKey::from_raw(1)).unwrap();
        let ShapeKind::Enumerable(enumerable) = list.kind() else {
            panic!("expected enumerable");
        };
        let element = list.resolve(enumerable.element).unwrap();
        assert_eq!(element.name(), "int");
        assert_eq!(element, provider.shape(TypeKey::from_raw(0)).unwrap());
    }
}
