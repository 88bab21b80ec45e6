//! Cross-thread artifact memoization, one cache per provider.

use std::fmt;
use std::sync::Arc;

use kata_shape::{ProviderId, Shape, ShapeProvider, TypeKey};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::context::TypeGenerationContext;
use crate::{Artifact, BuildError, BuilderConfig};

/// A settled per-type outcome.
enum CacheSlot<A: Artifact> {
    Value(A),
    Failed(BuildError),
}

/// Thread-safe artifact cache over a single provider's types.
///
/// Lookups take a read lock and clone out (artifacts are cheap handles).
/// Builds run outside any lock: a traversal works in its own
/// [`TypeGenerationContext`] and publishes the finished batch with one
/// validated commit. Concurrent traversals of the same types race
/// freely; whichever commits first wins and later committers adopt the
/// winner's instances, so callers observe exactly one artifact instance
/// per type.
///
/// Builder errors are returned to the caller; when the configuration
/// enables error memoization they are also recorded for the requested
/// type and replayed on later requests without re-running the builder.
pub struct TypeCache<A: Artifact> {
    provider_id: ProviderId,
    provider_name: Arc<str>,
    config: Arc<BuilderConfig<A>>,
    entries: RwLock<FxHashMap<TypeKey, CacheSlot<A>>>,
}

impl<A: Artifact> TypeCache<A> {
    /// Cache serving the given provider's types.
    pub fn new(provider: &ShapeProvider, config: BuilderConfig<A>) -> Self {
        Self::with_config(provider, Arc::new(config))
    }

    /// Cache sharing an already-wrapped configuration.
    pub(crate) fn with_config(provider: &ShapeProvider, config: Arc<BuilderConfig<A>>) -> Self {
        TypeCache {
            provider_id: provider.id(),
            provider_name: Arc::from(provider.name()),
            config,
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Identity of the provider this cache serves.
    pub fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    /// Diagnostic name of the provider this cache serves.
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Number of settled entries (artifacts and memoized errors).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache has no settled entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether `key` has a settled entry.
    pub fn contains_key(&self, key: TypeKey) -> bool {
        self.entries.read().contains_key(&key)
    }

    /// The settled outcome for `key`, if any, without building.
    ///
    /// A memoized error comes back as `Some(Err(..))`.
    pub fn get(&self, key: TypeKey) -> Option<Result<A, BuildError>> {
        let entries = self.entries.read();
        entries.get(&key).map(|slot| match slot {
            CacheSlot::Value(artifact) => Ok(artifact.clone()),
            CacheSlot::Failed(error) => Err(error.clone()),
        })
    }

    /// The artifact for `shape`, building (and publishing) it if absent.
    ///
    /// The build runs on the calling thread with no lock held, so
    /// several threads may build the same types at once; the commit
    /// protocol guarantees they all end up holding the same instances.
    ///
    /// # Panics
    ///
    /// Panics if `shape` does not belong to this cache's provider.
    /// Routing shapes from several providers belongs to
    /// [`MultiProviderCache`](crate::MultiProviderCache).
    #[tracing::instrument(level = "trace", skip_all, fields(ty = %shape.key(), provider = %self.provider_name))]
    pub fn get_or_add(&self, shape: &Shape) -> Result<A, BuildError> {
        assert!(
            shape.provider_id() == self.provider_id,
            "shape `{}` belongs to provider `{}`, this cache serves `{}`",
            shape.name(),
            shape.provider().name(),
            self.provider_name,
        );

        if let Some(settled) = self.get(shape.key()) {
            return settled;
        }

        // Each round adopts everything committed since the last one, so
        // repeated conflicts still make progress.
        loop {
            let mut context = TypeGenerationContext::with_parent(self, Arc::clone(&self.config));
            let built = match context.get_or_add(shape) {
                Ok(built) => built,
                Err(error) => {
                    if self.config.caches_errors() {
                        self.store_error(shape.key(), &error);
                    }
                    return Err(error);
                }
            };

            if context.try_commit() {
                return Ok(built);
            }
            if let Some(settled) = self.get(shape.key()) {
                tracing::debug!(ty = %shape.key(), "lost a publish race, adopting the cached artifact");
                return settled;
            }
            tracing::trace!(ty = %shape.key(), "a child artifact got published first, rebuilding");
        }
    }

    /// Publish a finished batch if it is consistent with what other
    /// traversals have already published.
    ///
    /// Validation and insertion run under one write-lock acquisition.
    /// An existing entry only passes validation when it holds the same
    /// artifact instance; any differing entry (including a memoized
    /// error) rejects the whole batch untouched.
    pub(crate) fn commit_entries(&self, staged: FxHashMap<TypeKey, A>) -> bool {
        let mut entries = self.entries.write();
        for (key, artifact) in &staged {
            match entries.get(key) {
                None => {}
                Some(CacheSlot::Value(existing)) if existing.same_instance(artifact) => {}
                Some(_) => return false,
            }
        }
        for (key, artifact) in staged {
            entries.insert(key, CacheSlot::Value(artifact));
        }
        true
    }

    /// Memoize a builder error for `key`. An already-settled entry
    /// stays; a concurrently published artifact beats a failure.
    fn store_error(&self, key: TypeKey, error: &BuildError) {
        let mut entries = self.entries.write();
        entries
            .entry(key)
            .or_insert_with(|| CacheSlot::Failed(error.clone()));
    }
}

impl<A: Artifact> fmt::Debug for TypeCache<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCache")
            .field("provider", &self.provider_name)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kata_shape::{ScalarKind, ShapeKind, ShapeProviderBuilder};

    use super::*;

    type Token = Arc<str>;

    fn int_provider() -> ShapeProvider {
        let mut builder = ShapeProviderBuilder::new("cache-tests");
        builder.scalar("int", ScalarKind::Int).unwrap();
        builder.build().unwrap()
    }

    /// Builder producing the shape's name as the artifact, counting
    /// invocations.
    fn token_config() -> (Arc<BuilderConfig<Token>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let config = BuilderConfig::new(move |shape, _ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::from(shape.name()))
        });
        (Arc::new(config), calls)
    }

    fn failing_config(memoize: bool) -> (BuilderConfig<Token>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let config = BuilderConfig::new(move |shape, _ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(BuildError::builder(shape, "deliberately unbuildable"))
        })
        .cache_errors(memoize);
        (config, calls)
    }

    #[test]
    fn artifacts_are_built_once_and_shared() {
        let provider = int_provider();
        let shape = provider.resolve(TypeKey::from_raw(0)).unwrap();
        let (config, calls) = token_config();
        let cache = TypeCache::with_config(&provider, config);

        let first = cache.get_or_add(&shape).unwrap();
        let second = cache.get_or_add(&shape).unwrap();
        assert!(first.same_instance(&second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let direct = cache.get(shape.key()).unwrap().unwrap();
        assert!(direct.same_instance(&first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn child_artifacts_land_in_the_cache_with_the_root() {
        let mut builder = ShapeProviderBuilder::new("tree");
        let int = builder.scalar("int", ScalarKind::Int).unwrap();
        let list = builder.enumerable("List<int>", int).unwrap();
        let provider = builder.build().unwrap();

        let config = BuilderConfig::new(|shape, ctx| {
            if let ShapeKind::Enumerable(enumerable) = shape.kind() {
                let element = shape.resolve(enumerable.element)?;
                let _ = ctx.get_or_add(&element)?;
            }
            Ok(Arc::from(shape.name()))
        });
        let cache: TypeCache<Token> = TypeCache::new(&provider, config);

        cache.get_or_add(&provider.resolve(list).unwrap()).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key(int));
    }

    #[test]
    #[should_panic(expected = "belongs to provider")]
    fn shapes_from_another_provider_are_rejected() {
        let provider = int_provider();
        let other = int_provider();
        let foreign = other.resolve(TypeKey::from_raw(0)).unwrap();
        let (config, _calls) = token_config();
        let cache = TypeCache::with_config(&provider, config);

        let _ = cache.get_or_add(&foreign);
    }

    #[test]
    fn memoized_errors_replay_without_rebuilding() {
        let provider = int_provider();
        let shape = provider.resolve(TypeKey::from_raw(0)).unwrap();
        let (config, calls) = failing_config(true);
        let cache = TypeCache::new(&provider, config);

        let first = cache.get_or_add(&shape).unwrap_err();
        let second = cache.get_or_add(&shape).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains_key(shape.key()));
    }

    #[test]
    fn errors_are_rebuilt_when_memoization_is_off() {
        let provider = int_provider();
        let shape = provider.resolve(TypeKey::from_raw(0)).unwrap();
        let (config, calls) = failing_config(false);
        let cache = TypeCache::new(&provider, config);

        let _ = cache.get_or_add(&shape).unwrap_err();
        let _ = cache.get_or_add(&shape).unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn conflicting_commit_is_atomic_and_nothing_from_it_lands() {
        let mut builder = ShapeProviderBuilder::new("overlap");
        let x = builder.scalar("x", ScalarKind::Int).unwrap();
        let y = builder.scalar("y", ScalarKind::Int).unwrap();
        let z = builder.scalar("z", ScalarKind::Int).unwrap();
        let provider = builder.build().unwrap();
        let (config, _calls) = token_config();
        let cache = TypeCache::with_config(&provider, Arc::clone(&config));

        let mut loser = TypeGenerationContext::with_parent(&cache, Arc::clone(&config));
        loser.insert(x, Arc::from("x from loser"));
        loser.insert(y, Arc::from("y from loser"));

        let winner_y: Token = Arc::from("y from winner");
        let mut winner = TypeGenerationContext::with_parent(&cache, Arc::clone(&config));
        winner.insert(y, Arc::clone(&winner_y));
        winner.insert(z, Arc::from("z from winner"));

        assert!(winner.try_commit());
        assert!(!loser.try_commit());

        // The losing batch left no trace, not even its conflict-free keys.
        assert!(cache.get(x).is_none());
        assert!(cache.get(y).unwrap().unwrap().same_instance(&winner_y));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn recommitting_the_same_instances_is_not_a_conflict() {
        let mut builder = ShapeProviderBuilder::new("agree");
        let x = builder.scalar("x", ScalarKind::Int).unwrap();
        let y = builder.scalar("y", ScalarKind::Int).unwrap();
        let provider = builder.build().unwrap();
        let (config, _calls) = token_config();
        let cache = TypeCache::with_config(&provider, Arc::clone(&config));

        let shared: Token = Arc::from("shared");
        let mut first = TypeGenerationContext::with_parent(&cache, Arc::clone(&config));
        first.insert(y, Arc::clone(&shared));
        assert!(first.try_commit());

        // A later batch re-publishing the instance it adopted passes
        // validation and lands its new keys.
        let mut second = TypeGenerationContext::with_parent(&cache, Arc::clone(&config));
        second.insert(y, Arc::clone(&shared));
        second.insert(x, Arc::from("x"));
        assert!(second.try_commit());
        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key(x));
    }
}
