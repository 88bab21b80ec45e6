//! Per-traversal artifact generation.
//!
//! A context lives for exactly one traversal: it starts empty, fills up
//! as the builder walks the type graph, and (when parented to a
//! [`TypeCache`]) ends with one all-or-nothing commit. Entries move
//! strictly forward through three states:
//!
//! ```text
//! (absent) -> Empty -> Delayed -> Completed
//!                 \_______________^
//! ```
//!
//! `Empty` marks "generation in progress" so that re-entering the same
//! type can be told apart from visiting it the first time; the second
//! visit is a cycle and materializes a [`DelayedValue`]. The marker is
//! only recorded when the configuration has a delayed factory; without
//! cycle support there is nothing useful to do on re-entry, so the
//! context stays out of the way and lets the builder's own recursion
//! surface the failure.

use std::sync::Arc;

use kata_shape::{Shape, TypeKey};
use rustc_hash::FxHashMap;

use crate::cache::TypeCache;
use crate::{Artifact, BuildError, BuilderConfig, DelayedValue};

/// One type's state within a traversal.
enum ContextEntry<A: Artifact> {
    /// Generation started; no artifact and no proxy yet.
    Empty,
    /// Re-entered during generation; a proxy is circulating.
    Delayed(DelayedValue<A>),
    /// Artifact generated.
    Completed(A),
}

/// Single-traversal artifact store, optionally parented to a cache.
///
/// Not `Sync`, not shared: one traversal, one thread, no locks. The
/// parent cache is read through on every lookup, so a traversal adopts
/// everything other traversals have already published and only builds
/// what is genuinely missing.
pub struct TypeGenerationContext<'p, A: Artifact> {
    parent: Option<&'p TypeCache<A>>,
    config: Arc<BuilderConfig<A>>,
    entries: FxHashMap<TypeKey, ContextEntry<A>>,
}

impl<'p, A: Artifact> TypeGenerationContext<'p, A> {
    /// Context that publishes into `parent` on commit.
    pub(crate) fn with_parent(parent: &'p TypeCache<A>, config: Arc<BuilderConfig<A>>) -> Self {
        TypeGenerationContext {
            parent: Some(parent),
            config,
            entries: FxHashMap::default(),
        }
    }

    /// Context for a one-off traversal with nothing behind it.
    ///
    /// Results stay in the context and die with it; committing one is a
    /// contract violation.
    pub fn standalone(config: Arc<BuilderConfig<A>>) -> Self {
        TypeGenerationContext {
            parent: None,
            config,
            entries: FxHashMap::default(),
        }
    }

    /// Number of types this traversal has touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this traversal has touched no types yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the artifact for `shape`, without building.
    ///
    /// Consults the parent cache first: artifacts (or memoized errors)
    /// already published by other traversals win over anything local.
    /// Locally, a first visit records the in-progress marker and
    /// reports a miss; a second visit during generation is a cycle and
    /// yields a freshly materialized proxy; later visits yield the
    /// existing proxy or the completed artifact.
    pub fn lookup(&mut self, shape: &Shape) -> Result<Option<A>, BuildError> {
        let key = shape.key();

        if let Some(parent) = self.parent {
            if let Some(published) = parent.get(key) {
                return published.map(Some);
            }
        }

        match self.entries.get(&key) {
            None => {
                // Only useful to remember the visit if re-entry can
                // materialize a proxy later.
                if self.config.delayed().is_some() {
                    self.entries.insert(key, ContextEntry::Empty);
                }
                Ok(None)
            }
            Some(ContextEntry::Empty) => {
                let Some(factory) = self.config.delayed() else {
                    unreachable!("in-progress marker recorded without a delayed factory")
                };
                let factory = Arc::clone(factory);
                let delayed = DelayedValue::new(|cell| (*factory)(cell));
                let proxy = delayed.proxy();
                tracing::trace!(ty = %key, "cycle detected, handing out delayed proxy");
                self.entries.insert(key, ContextEntry::Delayed(delayed));
                Ok(Some(proxy))
            }
            Some(ContextEntry::Delayed(delayed)) => Ok(Some(delayed.proxy())),
            Some(ContextEntry::Completed(artifact)) => Ok(Some(artifact.clone())),
        }
    }

    /// Look up the artifact for `shape`, building it if necessary.
    ///
    /// This is the entry point builders use for child types; it
    /// re-enters the configured builder, so recursion depth follows the
    /// type graph (guarded against stack overflow). The built artifact
    /// is recorded by the context itself; builders must not insert
    /// their own key.
    pub fn get_or_add(&mut self, shape: &Shape) -> Result<A, BuildError> {
        if let Some(found) = self.lookup(shape)? {
            return Ok(found);
        }

        let builder = Arc::clone(self.config.builder());
        let built = crate::stack::ensure_sufficient_stack(|| (*builder)(shape, self))?;
        self.insert(shape.key(), built.clone());
        Ok(built)
    }

    /// Record the generated artifact for `key`.
    ///
    /// Completes a circulating delayed proxy if the type turned out to
    /// be cyclic.
    ///
    /// # Panics
    ///
    /// Panics if an artifact for `key` was already generated in this
    /// traversal; generating a type twice means the builder and the
    /// context disagree about who owns memoization. Use
    /// [`overwrite`](TypeGenerationContext::overwrite) for the rare
    /// caller that replaces entries deliberately.
    pub fn insert(&mut self, key: TypeKey, artifact: A) {
        self.add(key, artifact, false);
    }

    /// Record the artifact for `key`, replacing any previous entry.
    ///
    /// A circulating delayed proxy is completed with the *first* value;
    /// replacement only affects what gets committed under the key.
    pub fn overwrite(&mut self, key: TypeKey, artifact: A) {
        self.add(key, artifact, true);
    }

    fn add(&mut self, key: TypeKey, artifact: A, overwrite: bool) {
        let previous = self
            .entries
            .insert(key, ContextEntry::Completed(artifact.clone()));
        match previous {
            Some(ContextEntry::Completed(_)) => {
                assert!(
                    overwrite,
                    "artifact for type {key} was already generated in this traversal"
                );
            }
            Some(ContextEntry::Delayed(delayed)) => delayed.complete(artifact),
            Some(ContextEntry::Empty) | None => {}
        }
    }

    /// Publish every completed entry into the parent cache, atomically.
    ///
    /// Validation and publication happen under one acquisition of the
    /// parent's write lock: either every entry is published or none is.
    /// Returns `false` when the parent already holds a *different*
    /// artifact (or a memoized error) for any key, in which case the
    /// caller should adopt what the parent has instead of retrying the
    /// same batch.
    ///
    /// # Panics
    ///
    /// Panics on a parentless context, and on any entry that is not
    /// completed; both are traversal-logic bugs, not runtime
    /// conditions.
    pub fn try_commit(self) -> bool {
        let Some(parent) = self.parent else {
            panic!("commit on a context with no parent cache")
        };

        let mut staged = FxHashMap::default();
        staged.reserve(self.entries.len());
        for (key, entry) in self.entries {
            match entry {
                ContextEntry::Completed(artifact) => {
                    staged.insert(key, artifact);
                }
                ContextEntry::Empty => {
                    panic!("commit with generation still in progress for type {key}")
                }
                ContextEntry::Delayed(_) => {
                    panic!("commit with an incomplete delayed artifact for type {key}")
                }
            }
        }

        parent.commit_entries(staged)
    }
}
