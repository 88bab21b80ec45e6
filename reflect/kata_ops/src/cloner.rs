//! Deep cloning driven by shapes.

use std::sync::Arc;

use kata_cache::{
    ensure_sufficient_stack, BuildError, BuilderConfig, DelayedCell, MultiProviderCache,
    TypeGenerationContext,
};
use kata_shape::{
    DictionaryShape, EnumShape, EnumerableShape, FieldGetter, NullableShape, ObjectShape, Shape,
    ShapeVisitor, TypeKey,
};
use kata_value::Value;

use crate::access::{list_items, map_entries};

/// Compiled clone operation for one type.
pub type CloneFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Shape-driven deep cloner.
///
/// Object and container values are rebuilt node by node, so the copy
/// shares no heap payloads with the original. Values of property-less
/// object types (scalars and opaque leaves) are reused as-is; their
/// payloads are immutable, so sharing is as good as copying. Recursive
/// types clone through a forwarding proxy.
///
/// # Example
///
/// ```
/// # use kata_ops::Cloner;
/// # use kata_shape::{ScalarKind, ShapeProviderBuilder};
/// # use kata_value::Value;
/// let mut builder = ShapeProviderBuilder::new("demo");
/// let int = builder.scalar("int", ScalarKind::Int)?;
/// let list = builder.enumerable("List<int>", int)?;
/// let provider = builder.build()?;
/// let shape = provider.resolve(list)?;
///
/// let cloner = Cloner::new();
/// let original = Value::list(vec![Value::int(1), Value::int(2)]);
/// let copy = cloner.deep_clone(&shape, &original)?;
/// assert_eq!(copy, original);
/// assert!(!copy.ptr_eq(&original));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Cloner {
    cache: MultiProviderCache<CloneFn>,
}

impl Cloner {
    /// A cloner with an empty artifact cache.
    pub fn new() -> Self {
        let config = BuilderConfig::new(build_clone).with_delayed(forwarding_clone);
        Cloner {
            cache: MultiProviderCache::new(config),
        }
    }

    /// The compiled clone closure for `shape`.
    ///
    /// Objects without a constructor cannot be rebuilt and are reported
    /// as unsupported.
    pub fn artifact(&self, shape: &Shape) -> Result<CloneFn, BuildError> {
        self.cache.get_or_add(shape)
    }

    /// Deep-clone `value` according to `shape`.
    ///
    /// # Panics
    ///
    /// Panics when `value` does not match `shape`.
    pub fn deep_clone(&self, shape: &Shape, value: &Value) -> Result<Value, BuildError> {
        let clone = self.artifact(shape)?;
        Ok((*clone)(value))
    }
}

impl Default for Cloner {
    fn default() -> Self {
        Cloner::new()
    }
}

/// Compiles the clone closure for one type.
fn build_clone(
    shape: &Shape,
    ctx: &mut TypeGenerationContext<'_, CloneFn>,
) -> Result<CloneFn, BuildError> {
    shape.accept(&mut CloneBuilder { ctx })
}

/// Proxy handed out on re-entry; forwards to the finished closure.
fn forwarding_clone(cell: &DelayedCell<CloneFn>) -> CloneFn {
    let cell = cell.clone();
    Arc::new(move |value| (*cell.get())(value))
}

struct CloneBuilder<'a, 'p> {
    ctx: &'a mut TypeGenerationContext<'p, CloneFn>,
}

impl CloneBuilder<'_, '_> {
    fn child(&mut self, shape: &Shape, key: TypeKey) -> Result<CloneFn, BuildError> {
        let child = shape.resolve(key)?;
        self.ctx.get_or_add(&child)
    }
}

impl ShapeVisitor for CloneBuilder<'_, '_> {
    type Output = Result<CloneFn, BuildError>;

    fn visit_object(&mut self, shape: &Shape, object: &ObjectShape) -> Self::Output {
        if object.properties.is_empty() {
            // Scalar payloads are immutable; share them.
            return Ok(Arc::new(Value::clone));
        }
        let Some(ctor) = object.ctor.clone() else {
            return Err(BuildError::unsupported("clone", shape));
        };
        let mut fields: Vec<(FieldGetter, CloneFn)> = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            let clone = self.child(shape, property.ty)?;
            fields.push((Arc::clone(&property.get), clone));
        }
        Ok(Arc::new(move |value| {
            ensure_sufficient_stack(|| {
                let rebuilt = fields
                    .iter()
                    .map(|(get, clone)| (*clone)(&(*get)(value)))
                    .collect();
                (*ctor)(rebuilt)
            })
        }))
    }

    fn visit_enum(&mut self, _shape: &Shape, _enumeration: &EnumShape) -> Self::Output {
        // Enum values are bare underlying scalars.
        Ok(Arc::new(Value::clone))
    }

    fn visit_nullable(&mut self, shape: &Shape, nullable: &NullableShape) -> Self::Output {
        let element = self.child(shape, nullable.element)?;
        Ok(Arc::new(move |value| {
            if value.is_null() {
                Value::Null
            } else {
                (*element)(value)
            }
        }))
    }

    fn visit_enumerable(&mut self, shape: &Shape, enumerable: &EnumerableShape) -> Self::Output {
        let element = self.child(shape, enumerable.element)?;
        Ok(Arc::new(move |value| {
            ensure_sufficient_stack(|| {
                let items = list_items("clone", value);
                Value::list(items.iter().map(|item| (*element)(item)).collect())
            })
        }))
    }

    fn visit_dictionary(&mut self, shape: &Shape, dictionary: &DictionaryShape) -> Self::Output {
        let key = self.child(shape, dictionary.key)?;
        let value = self.child(shape, dictionary.value)?;
        Ok(Arc::new(move |dict| {
            ensure_sufficient_stack(|| {
                let entries = map_entries("clone", dict);
                Value::map(
                    entries
                        .iter()
                        .map(|(k, v)| ((*key)(k), (*value)(v)))
                        .collect(),
                )
            })
        }))
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use kata_shape::{record_ctor, PropertyShape, ScalarKind, ShapeProvider, ShapeProviderBuilder};
    use pretty_assertions::assert_eq;

    use super::*;

    /// `int`, `str`, and `Point { x: int, label: str }`.
    fn point_provider() -> (ShapeProvider, TypeKey) {
        let mut builder = ShapeProviderBuilder::new("points");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        let label = builder.scalar("str", ScalarKind::Str).unwrap();
        let point = builder.reserve("Point").unwrap();
        builder
            .object(
                point,
                vec![
                    PropertyShape::indexed("x", int, 0),
                    PropertyShape::indexed("label", label, 1),
                ],
                Some(record_ctor(point)),
            )
            .unwrap();
        (builder.build().unwrap(), point)
    }

    #[test]
    fn scalars_share_their_payload() {
        let mut builder = ShapeProviderBuilder::new("scalars");
        let str_key = builder.scalar("str", ScalarKind::Str).unwrap();
        let provider = builder.build().unwrap();
        let shape = provider.resolve(str_key).unwrap();

        let original = Value::string("shared");
        let copy = Cloner::new().deep_clone(&shape, &original).unwrap();
        assert!(copy.ptr_eq(&original));
    }

    #[test]
    fn objects_are_rebuilt_through_getters_and_constructor() {
        let (provider, point) = point_provider();
        let shape = provider.resolve(point).unwrap();

        let original = Value::record(point, vec![Value::int(3), Value::string("origin")]);
        let copy = Cloner::new().deep_clone(&shape, &original).unwrap();

        assert_eq!(copy, original);
        // The record allocation is fresh even though the str field is
        // shared.
        assert!(!copy.ptr_eq(&original));
        let (_, fields) = copy.as_record().unwrap();
        let (_, original_fields) = original.as_record().unwrap();
        assert!(fields[1].ptr_eq(&original_fields[1]));
    }

    #[test]
    fn containers_get_fresh_payloads() {
        let mut builder = ShapeProviderBuilder::new("containers");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        let list = builder.enumerable("List<int>", int).unwrap();
        let dict = builder.dictionary("Map<int, int>", int, int).unwrap();
        let provider = builder.build().unwrap();

        let cloner = Cloner::new();

        let original = Value::list(vec![Value::int(1), Value::int(2)]);
        let copy = cloner
            .deep_clone(&provider.resolve(list).unwrap(), &original)
            .unwrap();
        assert_eq!(copy, original);
        assert!(!copy.ptr_eq(&original));

        let original = Value::map(vec![(Value::int(1), Value::int(10))]);
        let copy = cloner
            .deep_clone(&provider.resolve(dict).unwrap(), &original)
            .unwrap();
        assert_eq!(copy, original);
        assert!(!copy.ptr_eq(&original));
    }

    #[test]
    fn nullable_passes_null_through() {
        let mut builder = ShapeProviderBuilder::new("nullables");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        let opt = builder.nullable("int?", int).unwrap();
        let provider = builder.build().unwrap();
        let shape = provider.resolve(opt).unwrap();

        let cloner = Cloner::new();
        assert_eq!(cloner.deep_clone(&shape, &Value::Null).unwrap(), Value::Null);
        assert_eq!(
            cloner.deep_clone(&shape, &Value::int(9)).unwrap(),
            Value::int(9)
        );
    }

    #[test]
    fn objects_without_a_constructor_are_unsupported() {
        let mut builder = ShapeProviderBuilder::new("frozen");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        let frozen = builder.reserve("Frozen").unwrap();
        builder
            .object(frozen, vec![PropertyShape::indexed("value", int, 0)], None)
            .unwrap();
        let provider = builder.build().unwrap();
        let shape = provider.resolve(frozen).unwrap();

        let error = Cloner::new().artifact(&shape).err().unwrap();
        assert_eq!(
            error,
            BuildError::Unsupported {
                operation: "clone",
                type_name: Arc::from("Frozen"),
            }
        );
    }

    #[test]
    fn repeated_requests_reuse_the_artifact() {
        let (provider, point) = point_provider();
        let shape = provider.resolve(point).unwrap();

        let cloner = Cloner::new();
        let first = cloner.artifact(&shape).unwrap();
        let second = cloner.artifact(&shape).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
