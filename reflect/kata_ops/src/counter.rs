//! Counting the values reachable from an instance.
//!
//! The smallest of the operations and the template for new ones: one
//! visitor, one forwarding proxy, one facade.

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

/// Compiled node count for one type.
pub type CountFn = Arc<dyn Fn(&Value) -> u64 + Send + Sync>;

/// Shape-driven node counter.
///
/// `Null` counts zero, scalars and enum constants count one, and
/// containers and objects count themselves plus everything reachable
/// below them.
pub struct NodeCounter {
    cache: MultiProviderCache<CountFn>,
}

impl NodeCounter {
    /// A counter with an empty artifact cache.
    pub fn new() -> Self {
        let config = BuilderConfig::new(build_count).with_delayed(forwarding_count);
        NodeCounter {
            cache: MultiProviderCache::new(config),
        }
    }

    /// The compiled count closure for `shape`.
    pub fn artifact(&self, shape: &Shape) -> Result<CountFn, BuildError> {
        self.cache.get_or_add(shape)
    }

    /// Count the values reachable from `value`.
    ///
    /// # Panics
    ///
    /// Panics when `value` does not match `shape`.
    pub fn count(&self, shape: &Shape, value: &Value) -> Result<u64, BuildError> {
        let count = self.artifact(shape)?;
        Ok((*count)(value))
    }
}

impl Default for NodeCounter {
    fn default() -> Self {
        NodeCounter::new()
    }
}

fn build_count(
    shape: &Shape,
    ctx: &mut TypeGenerationContext<'_, CountFn>,
) -> Result<CountFn, BuildError> {
    shape.accept(&mut CountBuilder { ctx })
}

fn forwarding_count(cell: &DelayedCell<CountFn>) -> CountFn {
    let cell = cell.clone();
    Arc::new(move |value| (*cell.get())(value))
}

struct CountBuilder<'a, 'p> {
    ctx: &'a mut TypeGenerationContext<'p, CountFn>,
}

impl CountBuilder<'_, '_> {
    fn child(&mut self, shape: &Shape, key: TypeKey) -> Result<CountFn, BuildError> {
        let child = shape.resolve(key)?;
        self.ctx.get_or_add(&child)
    }
}

impl ShapeVisitor for CountBuilder<'_, '_> {
    type Output = Result<CountFn, BuildError>;

    fn visit_object(&mut self, shape: &Shape, object: &ObjectShape) -> Self::Output {
        if object.properties.is_empty() {
            return Ok(Arc::new(|value: &Value| u64::from(!value.is_null())));
        }
        let mut fields: Vec<(FieldGetter, CountFn)> = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            let count = self.child(shape, property.ty)?;
            fields.push((Arc::clone(&property.get), count));
        }
        Ok(Arc::new(move |value| {
            ensure_sufficient_stack(|| {
                1 + fields
                    .iter()
                    .map(|(get, count)| (*count)(&(*get)(value)))
                    .sum::<u64>()
            })
        }))
    }

    fn visit_enum(&mut self, _shape: &Shape, _enumeration: &EnumShape) -> Self::Output {
        Ok(Arc::new(|value: &Value| u64::from(!value.is_null())))
    }

    fn visit_nullable(&mut self, shape: &Shape, nullable: &NullableShape) -> Self::Output {
        let element = self.child(shape, nullable.element)?;
        Ok(Arc::new(move |value| {
            if value.is_null() {
                0
            } else {
                (*element)(value)
            }
        }))
    }

    fn visit_enumerable(&mut self, shape: &Shape, enumerable: &EnumerableShape) -> Self::Output {
        let element = self.child(shape, enumerable.element)?;
        Ok(Arc::new(move |value| {
            ensure_sufficient_stack(|| {
                let items = list_items("count", value);
                1 + items.iter().map(|item| (*element)(item)).sum::<u64>()
            })
        }))
    }

    fn visit_dictionary(&mut self, shape: &Shape, dictionary: &DictionaryShape) -> Self::Output {
        let key = self.child(shape, dictionary.key)?;
        let value_count = self.child(shape, dictionary.value)?;
        Ok(Arc::new(move |value| {
            ensure_sufficient_stack(|| {
                let entries = map_entries("count", value);
                1 + entries
                    .iter()
                    .map(|(k, v)| (*key)(k) + (*value_count)(v))
                    .sum::<u64>()
            })
        }))
    }
}
