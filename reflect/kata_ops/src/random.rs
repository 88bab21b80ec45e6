//! Seeded random value generation driven by shapes.

use std::sync::Arc;

use kata_cache::{
    ensure_sufficient_stack, BuildError, BuilderConfig, DelayedCell, MultiProviderCache,
    TypeGenerationContext,
};
use kata_shape::{
    DictionaryShape, EnumShape, EnumerableShape, NullableShape, ObjectShape, ScalarKind, Shape,
    ShapeVisitor, TypeKey,
};
use kata_value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Compiled generator for one type. The `u64` is the remaining size
/// budget.
pub type RandomFn = Arc<dyn Fn(&mut StdRng, u64) -> Value + Send + Sync>;

/// Shape-driven random value generator.
///
/// Generation is deterministic per seed and bounded by a size budget:
/// objects decrement it for their properties, collections halve it for
/// their elements, and at zero nullables yield `Null` while collections
/// come out empty. Recursive types therefore always produce finite
/// values.
///
/// Opaque scalars and objects without a constructor cannot be
/// generated; those failures are memoized, so a second request replays
/// the error without running the visitor again.
pub struct RandomGenerator {
    cache: MultiProviderCache<RandomFn>,
}

impl RandomGenerator {
    /// A generator with an empty artifact cache.
    pub fn new() -> Self {
        let config = BuilderConfig::new(build_random)
            .with_delayed(forwarding_random)
            .cache_errors(true);
        RandomGenerator {
            cache: MultiProviderCache::new(config),
        }
    }

    /// The compiled generator for `shape`.
    pub fn artifact(&self, shape: &Shape) -> Result<RandomFn, BuildError> {
        self.cache.get_or_add(shape)
    }

    /// Generate a value for `shape` from `seed` with a size budget.
    ///
    /// The same seed and budget produce the same value.
    pub fn generate(&self, shape: &Shape, seed: u64, size: u64) -> Result<Value, BuildError> {
        let generate = self.artifact(shape)?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok((*generate)(&mut rng, size))
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        RandomGenerator::new()
    }
}

/// Compiles the generator for one type.
fn build_random(
    shape: &Shape,
    ctx: &mut TypeGenerationContext<'_, RandomFn>,
) -> Result<RandomFn, BuildError> {
    shape.accept(&mut RandomBuilder { ctx })
}

/// Proxy handed out on re-entry; forwards to the finished generator.
fn forwarding_random(cell: &DelayedCell<RandomFn>) -> RandomFn {
    let cell = cell.clone();
    Arc::new(move |rng, size| (*cell.get())(rng, size))
}

/// Short lowercase ASCII string.
fn random_string(rng: &mut StdRng) -> Value {
    let len: u32 = rng.gen_range(0..8);
    let s: String = (0..len)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect();
    Value::string(s)
}

struct RandomBuilder<'a, 'p> {
    ctx: &'a mut TypeGenerationContext<'p, RandomFn>,
}

impl RandomBuilder<'_, '_> {
    fn child(&mut self, shape: &Shape, key: TypeKey) -> Result<RandomFn, BuildError> {
        let child = shape.resolve(key)?;
        self.ctx.get_or_add(&child)
    }
}

impl ShapeVisitor for RandomBuilder<'_, '_> {
    type Output = Result<RandomFn, BuildError>;

    fn visit_object(&mut self, shape: &Shape, object: &ObjectShape) -> Self::Output {
        if object.properties.is_empty() {
            return match object.scalar {
                // There is no way to invent a value for a type we know
                // nothing about.
                ScalarKind::Opaque => Err(BuildError::unsupported("random", shape)),
                ScalarKind::Bool => Ok(Arc::new(|rng, _| Value::Bool(rng.gen()))),
                ScalarKind::Int => Ok(Arc::new(|rng, _| Value::int(rng.gen()))),
                ScalarKind::Float => Ok(Arc::new(|rng, _| Value::float(rng.gen()))),
                ScalarKind::Str => Ok(Arc::new(|rng, _| random_string(rng))),
            };
        }
        let Some(ctor) = object.ctor.clone() else {
            return Err(BuildError::unsupported("random", shape));
        };
        let mut fields: Vec<RandomFn> = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            fields.push(self.child(shape, property.ty)?);
        }
        Ok(Arc::new(move |rng, size| {
            ensure_sufficient_stack(|| {
                // Properties spend from a decremented budget, so
                // object-only recursion bottoms out too.
                let child_size = size.saturating_sub(1);
                let values = fields
                    .iter()
                    .map(|field| (*field)(rng, child_size))
                    .collect();
                (*ctor)(values)
            })
        }))
    }

    fn visit_enum(&mut self, shape: &Shape, enumeration: &EnumShape) -> Self::Output {
        if enumeration.cases.is_empty() {
            // Freestanding flag carriers; fall back to the underlying
            // scalar.
            return self.child(shape, enumeration.underlying);
        }
        let values: Vec<i64> = enumeration.cases.iter().map(|case| case.value).collect();
        Ok(Arc::new(move |rng, _| {
            Value::int(values[rng.gen_range(0..values.len())])
        }))
    }

    fn visit_nullable(&mut self, shape: &Shape, nullable: &NullableShape) -> Self::Output {
        let element = self.child(shape, nullable.element)?;
        Ok(Arc::new(move |rng, size| {
            // Budget zero forces the base case.
            if size == 0 || rng.gen_bool(0.25) {
                Value::Null
            } else {
                (*element)(rng, size.saturating_sub(1))
            }
        }))
    }

    fn visit_enumerable(&mut self, shape: &Shape, enumerable: &EnumerableShape) -> Self::Output {
        let element = self.child(shape, enumerable.element)?;
        Ok(Arc::new(move |rng, size| {
            ensure_sufficient_stack(|| {
                let len = rng.gen_range(0..=size.min(4));
                // Halving keeps nested collections finite.
                let child_size = size / 2;
                let items = (0..len).map(|_| (*element)(rng, child_size)).collect();
                Value::list(items)
            })
        }))
    }

    fn visit_dictionary(&mut self, shape: &Shape, dictionary: &DictionaryShape) -> Self::Output {
        let key = self.child(shape, dictionary.key)?;
        let value = self.child(shape, dictionary.value)?;
        Ok(Arc::new(move |rng, size| {
            ensure_sufficient_stack(|| {
                let len = rng.gen_range(0..=size.min(4));
                let child_size = size / 2;
                let entries = (0..len)
                    .map(|_| ((*key)(rng, child_size), (*value)(rng, child_size)))
                    .collect();
                Value::map(entries)
            })
        }))
    }
}
