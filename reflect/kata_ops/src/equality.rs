//! Structural equality driven by shapes.

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

/// Compiled equality predicate for one type.
pub type EqFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Shape-driven structural equality.
///
/// Unlike `Value`'s own `PartialEq`, comparison follows the *shape*:
/// objects compare property by property through their getters (extra
/// record fields the shape does not declare are ignored), and
/// dictionaries compare as unordered key/value sets. Works on recursive
/// types; recursion is bounded by the values, so it terminates on
/// finite inputs.
pub struct StructuralEq {
    cache: MultiProviderCache<EqFn>,
}

impl StructuralEq {
    /// A comparer with an empty artifact cache.
    pub fn new() -> Self {
        let config = BuilderConfig::new(build_eq).with_delayed(forwarding_eq);
        StructuralEq {
            cache: MultiProviderCache::new(config),
        }
    }

    /// The compiled equality predicate for `shape`.
    pub fn artifact(&self, shape: &Shape) -> Result<EqFn, BuildError> {
        self.cache.get_or_add(shape)
    }

    /// Whether `a` and `b` are structurally equal under `shape`.
    ///
    /// # Panics
    ///
    /// Panics when either value does not match `shape`.
    pub fn equal(&self, shape: &Shape, a: &Value, b: &Value) -> Result<bool, BuildError> {
        let eq = self.artifact(shape)?;
        Ok((*eq)(a, b))
    }
}

impl Default for StructuralEq {
    fn default() -> Self {
        StructuralEq::new()
    }
}

/// Compiles the equality predicate for one type.
fn build_eq(
    shape: &Shape,
    ctx: &mut TypeGenerationContext<'_, EqFn>,
) -> Result<EqFn, BuildError> {
    shape.accept(&mut EqBuilder { ctx })
}

/// Proxy handed out on re-entry; forwards to the finished predicate.
fn forwarding_eq(cell: &DelayedCell<EqFn>) -> EqFn {
    let cell = cell.clone();
    Arc::new(move |a, b| (*cell.get())(a, b))
}

struct EqBuilder<'a, 'p> {
    ctx: &'a mut TypeGenerationContext<'p, EqFn>,
}

impl EqBuilder<'_, '_> {
    fn child(&mut self, shape: &Shape, key: TypeKey) -> Result<EqFn, BuildError> {
        let child = shape.resolve(key)?;
        self.ctx.get_or_add(&child)
    }
}

impl ShapeVisitor for EqBuilder<'_, '_> {
    type Output = Result<EqFn, BuildError>;

    fn visit_object(&mut self, shape: &Shape, object: &ObjectShape) -> Self::Output {
        if object.properties.is_empty() {
            return Ok(Arc::new(|a: &Value, b: &Value| a == b));
        }
        let mut fields: Vec<(FieldGetter, EqFn)> = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            let eq = self.child(shape, property.ty)?;
            fields.push((Arc::clone(&property.get), eq));
        }
        Ok(Arc::new(move |a, b| {
            ensure_sufficient_stack(|| {
                fields
                    .iter()
                    .all(|(get, eq)| (*eq)(&(*get)(a), &(*get)(b)))
            })
        }))
    }

    fn visit_enum(&mut self, _shape: &Shape, _enumeration: &EnumShape) -> Self::Output {
        Ok(Arc::new(|a: &Value, b: &Value| a == b))
    }

    fn visit_nullable(&mut self, shape: &Shape, nullable: &NullableShape) -> Self::Output {
        let element = self.child(shape, nullable.element)?;
        Ok(Arc::new(move |a, b| match (a.is_null(), b.is_null()) {
            (true, true) => true,
            (true, false) | (false, true) => false,
            (false, false) => (*element)(a, b),
        }))
    }

    fn visit_enumerable(&mut self, shape: &Shape, enumerable: &EnumerableShape) -> Self::Output {
        let element = self.child(shape, enumerable.element)?;
        Ok(Arc::new(move |a, b| {
            ensure_sufficient_stack(|| {
                let left = list_items("compare", a);
                let right = list_items("compare", b);
                left.len() == right.len()
                    && left.iter().zip(right).all(|(x, y)| (*element)(x, y))
            })
        }))
    }

    fn visit_dictionary(&mut self, shape: &Shape, dictionary: &DictionaryShape) -> Self::Output {
        let key_eq = self.child(shape, dictionary.key)?;
        let value_eq = self.child(shape, dictionary.value)?;
        Ok(Arc::new(move |a, b| {
            ensure_sufficient_stack(|| {
                let left = map_entries("compare", a);
                let right = map_entries("compare", b);
                // Entry order is representation detail; match every
                // left entry against some right entry. Dictionary
                // shapes imply unique keys.
                left.len() == right.len()
                    && left.iter().all(|(lk, lv)| {
                        right
                            .iter()
                            .any(|(rk, rv)| (*key_eq)(lk, rk) && (*value_eq)(lv, rv))
                    })
            })
        }))
    }
}
