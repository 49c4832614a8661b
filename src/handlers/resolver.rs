//! The current resolver.
//!
//! A rendering host keeps one [`ResolverSlot`] and threads it (usually inside a
//! [`ViewEngine`](crate::engine::ViewEngine)) to every call site that needs a
//! handler. The slot builds its default resolver lazily, exactly once, and can
//! be pointed at a different resolver at any time, e.g. to isolate tests or to
//! apply new configuration. Replacement swaps the whole resolver; callers that
//! already obtained the previous one keep using it until they ask again.

use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::resolution::{
    DEFAULT_RESOLVER_NAME, HandlerFactory, HandlerFactoryExt, HandlerResolutionCache,
};
use super::source::ModuleCatalog;
use super::view::Handler;
use crate::config::HandlersConfig;
use crate::core::ViewbindError;

type MakeDefault = Box<dyn Fn() -> Arc<dyn HandlerFactory> + Send + Sync>;

/// Holds the resolver call sites should use.
pub struct ResolverSlot {
    replacement: RwLock<Option<Arc<dyn HandlerFactory>>>,
    default: OnceLock<Arc<dyn HandlerFactory>>,
    make_default: MakeDefault,
}

impl ResolverSlot {
    /// A slot whose default resolver is built by `make_default` on first use.
    pub fn new<F>(make_default: F) -> Self
    where
        F: Fn() -> Arc<dyn HandlerFactory> + Send + Sync + 'static,
    {
        Self {
            replacement: RwLock::new(None),
            default: OnceLock::new(),
            make_default: Box::new(make_default),
        }
    }

    /// A slot that always starts out with `resolver`.
    pub fn with_resolver(resolver: Arc<dyn HandlerFactory>) -> Self {
        Self::new(move || Arc::clone(&resolver))
    }

    /// A slot whose default resolver is built from configuration.
    ///
    /// Module names are checked now; discovery still waits for the first
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::UnknownHandlerModule`] if the configuration
    /// names a module the catalog does not contain.
    pub fn configured(
        config: &HandlersConfig,
        catalog: &ModuleCatalog,
    ) -> Result<Self, ViewbindError> {
        let selected = catalog.select(&config.modules)?;
        let name = config.resolver_name.clone().unwrap_or_else(|| DEFAULT_RESOLVER_NAME.to_string());

        Ok(Self::new(move || {
            debug!(resolver = %name, "Building configured handler resolver");
            Arc::new(HandlerResolutionCache::new(name.clone(), selected.clone()))
        }))
    }

    /// The resolver to use right now.
    pub fn current(&self) -> Arc<dyn HandlerFactory> {
        if let Some(resolver) = self.replacement.read().as_ref() {
            return Arc::clone(resolver);
        }
        Arc::clone(self.default.get_or_init(|| (self.make_default)()))
    }

    /// Make `resolver` the current resolver.
    pub fn replace(&self, resolver: Arc<dyn HandlerFactory>) {
        debug!(resolver = resolver.name(), "Replacing current handler resolver");
        *self.replacement.write() = Some(resolver);
    }

    /// Go back to the default resolver.
    pub fn reset(&self) {
        *self.replacement.write() = None;
    }

    /// Construct the handler for model type `M` with the current resolver.
    pub fn resolve<M: 'static>(&self) -> Result<Box<dyn Handler<M>>, ViewbindError> {
        self.current().resolve::<M>()
    }
}

impl std::fmt::Debug for ResolverSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverSlot")
            .field("replaced", &self.replacement.read().is_some())
            .field("default_built", &self.default.get().is_some())
            .finish_non_exhaustive()
    }
}
