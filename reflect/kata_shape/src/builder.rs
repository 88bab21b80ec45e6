//! Constructing shape providers.
//!
//! The builder is the only way to mint a [`ShapeProvider`]. Keys are
//! allocated densely from zero in declaration order; recursive types are
//! declared by reserving a key first and defining it once every key it
//! needs is in hand. `build()` validates the whole universe at once, so
//! a provider in circulation never contains a dangling reference.

use std::sync::Arc;

use kata_value::TypeKey;
use rustc_hash::FxHashMap;

use crate::provider::{ProviderCore, ShapeData};
use crate::{
    DictionaryShape, EnumCase, EnumShape, EnumerableShape, InstanceCtor, NullableShape,
    ObjectShape, PropertyShape, ScalarKind, ShapeError, ShapeKind, ShapeProvider,
};

/// One key's state during building.
enum Pending {
    Reserved { name: Arc<str> },
    Defined(ShapeData),
}

/// Builder for an immutable shape provider.
///
/// # Example
///
/// ```
/// # use kata_shape::{PropertyShape, ScalarKind, ShapeProviderBuilder, record_ctor};
/// let mut builder = ShapeProviderBuilder::new("demo");
/// let int = builder.scalar("int", ScalarKind::Int)?;
/// let node = builder.reserve("Node")?;
/// let children = builder.enumerable("List<Node>", node)?;
/// builder.object(
///     node,
///     vec![
///         PropertyShape::indexed("value", int, 0),
///         PropertyShape::indexed("children", children, 1),
///     ],
///     Some(record_ctor(node)),
/// )?;
/// let provider = builder.build()?;
/// assert_eq!(provider.len(), 3);
/// # Ok::<(), kata_shape::ShapeError>(())
/// ```
pub struct ShapeProviderBuilder {
    name: Arc<str>,
    shapes: Vec<Pending>,
    by_name: FxHashMap<Arc<str>, TypeKey>,
}

impl ShapeProviderBuilder {
    /// Create a builder for a provider with the given diagnostic name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        ShapeProviderBuilder {
            name: name.into(),
            shapes: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Allocate a key for `name` without defining it yet.
    ///
    /// The forward-declaration half of recursive type definitions.
    pub fn reserve(&mut self, name: impl Into<Arc<str>>) -> Result<TypeKey, ShapeError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(ShapeError::DuplicateType { name });
        }
        let raw = u32::try_from(self.shapes.len()).map_err(|_| ShapeError::TooManyTypes {
            provider: Arc::clone(&self.name),
            count: self.shapes.len(),
        })?;
        let key = TypeKey::from_raw(raw);
        self.by_name.insert(Arc::clone(&name), key);
        self.shapes.push(Pending::Reserved { name });
        Ok(key)
    }

    /// Define a previously reserved key.
    pub fn define(&mut self, key: TypeKey, kind: ShapeKind) -> Result<(), ShapeError> {
        let index = key.raw() as usize;
        let Some(slot) = self.shapes.get_mut(index) else {
            return Err(ShapeError::UnknownType {
                key,
                provider: Arc::clone(&self.name),
            });
        };
        match slot {
            Pending::Reserved { name } => {
                let name = Arc::clone(name);
                *slot = Pending::Defined(ShapeData { name, kind });
                Ok(())
            }
            Pending::Defined(data) => Err(ShapeError::AlreadyDefined {
                name: Arc::clone(&data.name),
                key,
            }),
        }
    }

    /// Declare a leaf type: a property-less object with a scalar hint.
    pub fn scalar(
        &mut self,
        name: impl Into<Arc<str>>,
        scalar: ScalarKind,
    ) -> Result<TypeKey, ShapeError> {
        let key = self.reserve(name)?;
        self.define(
            key,
            ShapeKind::Object(ObjectShape {
                properties: Vec::new(),
                ctor: None,
                scalar,
            }),
        )?;
        Ok(key)
    }

    /// Define a reserved key as an object type.
    pub fn object(
        &mut self,
        key: TypeKey,
        properties: Vec<PropertyShape>,
        ctor: Option<InstanceCtor>,
    ) -> Result<(), ShapeError> {
        self.define(
            key,
            ShapeKind::Object(ObjectShape {
                properties,
                ctor,
                scalar: ScalarKind::Opaque,
            }),
        )
    }

    /// Declare an enum type over an underlying scalar type.
    pub fn enumeration(
        &mut self,
        name: impl Into<Arc<str>>,
        underlying: TypeKey,
        cases: Vec<EnumCase>,
    ) -> Result<TypeKey, ShapeError> {
        let key = self.reserve(name)?;
        self.define(key, ShapeKind::Enum(EnumShape { underlying, cases }))?;
        Ok(key)
    }

    /// Declare a nullable wrapper around `element`.
    pub fn nullable(
        &mut self,
        name: impl Into<Arc<str>>,
        element: TypeKey,
    ) -> Result<TypeKey, ShapeError> {
        let key = self.reserve(name)?;
        self.define(key, ShapeKind::Nullable(NullableShape { element }))?;
        Ok(key)
    }

    /// Declare a sequence of `element`.
    pub fn enumerable(
        &mut self,
        name: impl Into<Arc<str>>,
        element: TypeKey,
    ) -> Result<TypeKey, ShapeError> {
        let key = self.reserve(name)?;
        self.define(key, ShapeKind::Enumerable(EnumerableShape { element }))?;
        Ok(key)
    }

    /// Declare a keyed collection from `key_ty` to `value_ty`.
    pub fn dictionary(
        &mut self,
        name: impl Into<Arc<str>>,
        key_ty: TypeKey,
        value_ty: TypeKey,
    ) -> Result<TypeKey, ShapeError> {
        let key = self.reserve(name)?;
        self.define(
            key,
            ShapeKind::Dictionary(DictionaryShape {
                key: key_ty,
                value: value_ty,
            }),
        )?;
        Ok(key)
    }

    /// Key previously allocated for `name`, if any.
    pub fn key_of(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Validate the universe and freeze it into a provider.
    ///
    /// Fails if any reserved key is still undefined or any definition
    /// references a key this builder never allocated.
    pub fn build(self) -> Result<ShapeProvider, ShapeError> {
        let count = self.shapes.len();
        let mut shapes = Vec::with_capacity(count);
        for pending in self.shapes {
            match pending {
                Pending::Reserved { name } => {
                    return Err(ShapeError::Undefined { name });
                }
                Pending::Defined(data) => {
                    for child in data.kind.child_keys() {
                        if child.raw() as usize >= count {
                            return Err(ShapeError::Dangling {
                                name: Arc::clone(&data.name),
                                referenced: child,
                            });
                        }
                    }
                    shapes.push(data);
                }
            }
        }
        Ok(ShapeProvider::from_core(Arc::new(ProviderCore {
            name: self.name,
            shapes,
        })))
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use kata_value::Value;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::record_ctor;

    #[test]
    fn build_and_look_up_flat_types() {
        let mut builder = ShapeProviderBuilder::new("flat");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        let str_ty = builder.scalar("str", ScalarKind::Str).unwrap();
        let map = builder.dictionary("Map<str, int>", str_ty, int).unwrap();
        let provider = builder.build().unwrap();

        let shape = provider.shape(map).unwrap();
        assert_eq!(shape.name(), "Map<str, int>");
        let ShapeKind::Dictionary(dictionary) = shape.kind() else {
            panic!("expected dictionary");
        };
        assert_eq!(dictionary.key, str_ty);
        assert_eq!(dictionary.value, int);
    }

    #[test]
    fn reserve_then_define_allows_recursion() {
        let mut builder = ShapeProviderBuilder::new("recursive");
        let node = builder.reserve("Node").unwrap();
        let children = builder.enumerable("List<Node>", node).unwrap();
        builder
            .object(
                node,
                vec![PropertyShape::indexed("children", children, 0)],
                Some(record_ctor(node)),
            )
            .unwrap();
        let provider = builder.build().unwrap();

        let shape = provider.shape(node).unwrap();
        let ShapeKind::Object(object) = shape.kind() else {
            panic!("expected object");
        };
        assert_eq!(object.properties.len(), 1);
        assert_eq!(object.properties[0].ty, children);

        // The constructor round-trips through the record representation.
        let ctor = object.ctor.clone().unwrap();
        let instance = (*ctor)(vec![Value::list(vec![])]);
        assert_eq!(instance.as_record().unwrap().0, node);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = ShapeProviderBuilder::new("dup");
        builder.scalar("int", ScalarKind::Int).unwrap();
        let err = builder.scalar("int", ScalarKind::Int).unwrap_err();
        assert_eq!(err, ShapeError::DuplicateType { name: "int".into() });
    }

    #[test]
    fn undefined_reservation_fails_build() {
        let mut builder = ShapeProviderBuilder::new("undef");
        builder.reserve("Ghost").unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(err, ShapeError::Undefined { name: "Ghost".into() });
    }

    #[test]
    fn dangling_reference_fails_build() {
        let mut builder = ShapeProviderBuilder::new("dangling");
        builder
            .enumerable("broken", TypeKey::from_raw(42))
            .unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(
            err,
            ShapeError::Dangling {
                name: "broken".into(),
                referenced: TypeKey::from_raw(42),
            }
        );
    }

    #[test]
    fn double_define_is_rejected() {
        let mut builder = ShapeProviderBuilder::new("twice");
        let key = builder.reserve("T").unwrap();
        builder.object(key, vec![], None).unwrap();
        let err = builder.object(key, vec![], None).unwrap_err();
        assert_eq!(
            err,
            ShapeError::AlreadyDefined {
                name: "T".into(),
                key,
            }
        );
    }

    #[test]
    fn key_of_finds_reserved_and_defined_names() {
        let mut builder = ShapeProviderBuilder::new("names");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        let node = builder.reserve("Node").unwrap();
        assert_eq!(builder.key_of("int"), Some(int));
        assert_eq!(builder.key_of("Node"), Some(node));
        assert_eq!(builder.key_of("missing"), None);
    }
}
