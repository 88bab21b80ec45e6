//! Application wiring shared by contexts and caches.

use std::sync::Arc;

use kata_shape::Shape;

use crate::{Artifact, BuildError, DelayedCell, TypeGenerationContext};

/// Builds the artifact for one type, requesting child artifacts through
/// the generation context.
pub type ArtifactBuilder<A> = Arc<
    dyn for<'p> Fn(&Shape, &mut TypeGenerationContext<'p, A>) -> Result<A, BuildError>
        + Send
        + Sync,
>;

/// Builds a cycle-breaking proxy over a cell. The proxy must capture
/// the cell and read it only when invoked, never while being built.
pub type DelayedFactory<A> = Arc<dyn Fn(&DelayedCell<A>) -> A + Send + Sync>;

/// Everything an application configures once and every context and
/// cache of that application shares: how to build an artifact, whether
/// (and how) cycles are supported, and whether builder errors are
/// memoized.
///
/// # Example
///
/// ```text
/// let config = BuilderConfig::new(build_clone)
///     .with_delayed(|cell| forwarding_proxy(cell))
///     .cache_errors(true);
/// ```
pub struct BuilderConfig<A: Artifact> {
    builder: ArtifactBuilder<A>,
    delayed: Option<DelayedFactory<A>>,
    cache_errors: bool,
}

impl<A: Artifact> BuilderConfig<A> {
    /// Configuration with the given per-type builder, no cycle support,
    /// and no error memoization.
    pub fn new<F>(builder: F) -> Self
    where
        F: for<'p> Fn(&Shape, &mut TypeGenerationContext<'p, A>) -> Result<A, BuildError>
            + Send
            + Sync
            + 'static,
    {
        BuilderConfig {
            builder: Arc::new(builder),
            delayed: None,
            cache_errors: false,
        }
    }

    /// Enable recursive type support with the given proxy factory.
    ///
    /// Without one, re-entering a type during its own generation is not
    /// detected specially; the builder simply recurses and reports its
    /// own failure.
    #[must_use]
    pub fn with_delayed<F>(mut self, factory: F) -> Self
    where
        F: Fn(&DelayedCell<A>) -> A + Send + Sync + 'static,
    {
        self.delayed = Some(Arc::new(factory));
        self
    }

    /// Memoize builder errors per requested type and replay them on
    /// later requests instead of re-running the builder.
    #[must_use]
    pub fn cache_errors(mut self, enabled: bool) -> Self {
        self.cache_errors = enabled;
        self
    }

    pub(crate) fn builder(&self) -> &ArtifactBuilder<A> {
        &self.builder
    }

    pub(crate) fn delayed(&self) -> Option<&DelayedFactory<A>> {
        self.delayed.as_ref()
    }

    pub(crate) fn caches_errors(&self) -> bool {
        self.cache_errors
    }
}
