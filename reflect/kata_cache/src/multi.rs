//! Routing artifacts across any number of providers.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use kata_shape::{ProviderId, Shape, ShapeProvider, TypeKey, WeakShapeProvider};
use rustc_hash::FxBuildHasher;

use crate::{Artifact, BuildError, BuilderConfig, TypeCache};

/// One provider's cache plus liveness tracking.
struct ProviderSlot<A: Artifact> {
    provider: WeakShapeProvider,
    cache: Arc<TypeCache<A>>,
}

/// A family of [`TypeCache`]s sharing one configuration, keyed by
/// provider identity.
///
/// The registry holds providers weakly: registering a provider here
/// does not keep it alive, and slots whose provider has been dropped
/// are reclaimed by [`sweep`](MultiProviderCache::sweep) (also run
/// before registering a new provider). Artifacts from different
/// providers never mix, even for structurally identical type
/// universes.
pub struct MultiProviderCache<A: Artifact> {
    config: Arc<BuilderConfig<A>>,
    caches: DashMap<ProviderId, ProviderSlot<A>, FxBuildHasher>,
}

impl<A: Artifact> MultiProviderCache<A> {
    /// Registry applying `config` to every provider it meets.
    pub fn new(config: BuilderConfig<A>) -> Self {
        MultiProviderCache {
            config: Arc::new(config),
            caches: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Number of registered providers, dead slots included until the
    /// next sweep.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// The cache serving `provider`, created on first sight.
    ///
    /// The returned handle stays valid after the provider is dropped
    /// and swept; it simply stops being reachable through the registry.
    pub fn scoped(&self, provider: &ShapeProvider) -> Arc<TypeCache<A>> {
        let id = provider.id();

        // Fast path under the shard read lock only.
        if let Some(slot) = self.caches.get(&id) {
            if slot.provider.upgrade().is_some() {
                return Arc::clone(&slot.cache);
            }
        }

        // First sight of this provider (or of a new provider reusing a
        // dead one's identity): reclaim dead slots, then register.
        self.sweep();
        match self.caches.entry(id) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().provider.upgrade().is_some() {
                    Arc::clone(&occupied.get().cache)
                } else {
                    let cache = self.fresh_cache(provider);
                    occupied.insert(ProviderSlot {
                        provider: provider.downgrade(),
                        cache: Arc::clone(&cache),
                    });
                    cache
                }
            }
            Entry::Vacant(vacant) => {
                let cache = self.fresh_cache(provider);
                vacant.insert(ProviderSlot {
                    provider: provider.downgrade(),
                    cache: Arc::clone(&cache),
                });
                cache
            }
        }
    }

    /// The artifact for `shape`, routed to its provider's cache.
    pub fn get_or_add(&self, shape: &Shape) -> Result<A, BuildError> {
        self.scoped(&shape.provider()).get_or_add(shape)
    }

    /// The artifact for `key` as declared by `provider`.
    ///
    /// Fails with the provider's lookup error when `key` is not one of
    /// its types.
    pub fn get_or_add_key(&self, provider: &ShapeProvider, key: TypeKey) -> Result<A, BuildError> {
        let shape = provider.resolve(key)?;
        self.scoped(provider).get_or_add(&shape)
    }

    /// Drop every slot whose provider is gone.
    pub fn sweep(&self) {
        self.caches
            .retain(|_, slot| slot.provider.upgrade().is_some());
    }

    fn fresh_cache(&self, provider: &ShapeProvider) -> Arc<TypeCache<A>> {
        tracing::debug!(provider = provider.name(), "creating provider cache");
        Arc::new(TypeCache::with_config(provider, Arc::clone(&self.config)))
    }
}

impl<A: Artifact> fmt::Debug for MultiProviderCache<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiProviderCache")
            .field("providers", &self.caches.len())
            .finish_non_exhaustive()
    }
}
