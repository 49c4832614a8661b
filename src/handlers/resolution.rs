//! Handler resolution with a per-model decision cache.
//!
//! [`HandlerResolutionCache`] answers "which handler serves model `M`?" by
//! scanning the registry's universe once per model type and remembering the
//! answer. The decision cache is never evicted: the universe does not change
//! for the lifetime of the resolver, so a decision can never go stale.
//!
//! # Resolution Steps
//!
//! 1. Reject model types that can stand for any value
//! 2. Return the cached decision for the model, if there is one
//! 3. Otherwise take the first handler in discovery order that serves the model
//! 4. Otherwise ask the default-handler hook; if that has nothing either, fail
//! 5. Cache the decision, then construct a fresh handler instance
//!
//! Two threads racing to populate the same model both compute the same answer
//! from the same universe, so the later insert simply overwrites the earlier one.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::defaults::DefaultHandlers;
use super::descriptor::{Capability, ErasedHandler};
use super::registry::HandlerRegistry;
use super::source::{HandlerSource, ModuleCatalog};
use super::view::Handler;
use crate::config::HandlersConfig;
use crate::core::{ModelKey, ViewbindError};

/// Something that can construct handlers by model type.
///
/// Object-safe so a resolver can be swapped behind an `Arc<dyn HandlerFactory>`;
/// the typed entry point is [`HandlerFactoryExt::resolve`].
pub trait HandlerFactory: Send + Sync {
    /// Identity of this resolver, used in error messages.
    fn name(&self) -> &str;

    /// Construct a handler for `model`, with its model type erased.
    fn activate(&self, model: &ModelKey) -> Result<ErasedHandler, ViewbindError>;
}

/// Typed resolution for every [`HandlerFactory`].
pub trait HandlerFactoryExt {
    /// Construct the handler for model type `M`.
    ///
    /// # Errors
    ///
    /// - [`ViewbindError::UniversalModelType`] if `M` can stand for any value
    /// - [`ViewbindError::HandlerNotFound`] if nothing serves `M`
    /// - [`ViewbindError::ActivationFailed`] if the handler could not be built
    fn resolve<M: 'static>(&self) -> Result<Box<dyn Handler<M>>, ViewbindError>;
}

impl<F: HandlerFactory + ?Sized> HandlerFactoryExt for F {
    fn resolve<M: 'static>(&self) -> Result<Box<dyn Handler<M>>, ViewbindError> {
        let model = ModelKey::of::<M>();
        self.activate(&model)?.downcast::<M>().map_err(|erased| ViewbindError::ActivationFailed {
            resolver: self.name().to_string(),
            handler: erased.handler_name().to_string(),
            model: model.name().to_string(),
            reason: "constructed handler does not produce this model type".to_string(),
        })
    }
}

/// Default identity of configuration-built resolvers.
pub const DEFAULT_RESOLVER_NAME: &str = "viewbind::configured";

/// Resolves handlers from a [`HandlerRegistry`], caching one decision per model type.
///
/// # Examples
///
/// ```rust
/// use viewbind::handlers::{
///     Handler, HandlerDescriptor, HandlerFactoryExt, HandlerResolutionCache, View, ViewContext,
/// };
///
/// struct Foo;
/// #[derive(Default)]
/// struct FooHandler;
///
/// impl Handler<Foo> for FooHandler {
///     fn model(&self, _view: &dyn ViewContext) -> Option<Foo> {
///         Some(Foo)
///     }
/// }
///
/// let resolver = HandlerResolutionCache::new(
///     "example",
///     vec![HandlerDescriptor::of_default::<FooHandler>().handles::<Foo>().build()],
/// );
/// let handler = resolver.resolve::<Foo>()?;
/// assert!(handler.model(&View::new("foo")).is_some());
/// # Ok::<(), viewbind::core::ViewbindError>(())
/// ```
pub struct HandlerResolutionCache {
    name: String,
    registry: HandlerRegistry,
    defaults: Option<Arc<dyn DefaultHandlers>>,
    decisions: DashMap<ModelKey, Capability>,
}

impl HandlerResolutionCache {
    /// Create a resolver named `name` over `source`.
    pub fn new(name: impl Into<String>, source: impl HandlerSource + 'static) -> Self {
        Self {
            name: name.into(),
            registry: HandlerRegistry::new(source),
            defaults: None,
            decisions: DashMap::new(),
        }
    }

    /// Build a resolver from configuration, restricting `catalog` to the
    /// configured modules.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::UnknownHandlerModule`] if the configuration
    /// names a module the catalog does not contain.
    pub fn from_config(
        config: &HandlersConfig,
        catalog: &ModuleCatalog,
    ) -> Result<Self, ViewbindError> {
        let selected = catalog.select(&config.modules)?;
        let name = config.resolver_name.as_deref().unwrap_or(DEFAULT_RESOLVER_NAME);
        Ok(Self::new(name, selected))
    }

    /// Install a default-handler hook.
    pub fn with_defaults(mut self, defaults: impl DefaultHandlers + 'static) -> Self {
        self.defaults = Some(Arc::new(defaults));
        self
    }

    /// The underlying handler registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Handler type name cached for `model`, if it has been resolved before.
    pub fn cached_handler(&self, model: &ModelKey) -> Option<&'static str> {
        self.decisions.get(model).map(|capability| capability.handler_name())
    }

    /// Number of model types with a cached decision.
    pub fn cached_len(&self) -> usize {
        self.decisions.len()
    }

    /// Pick the capability that serves `model`, consulting and filling the cache.
    pub fn decide(&self, model: &ModelKey) -> Result<Capability, ViewbindError> {
        if model.is_universal() {
            return Err(ViewbindError::UniversalModelType {
                resolver: self.name.clone(),
                model: model.name().to_string(),
            });
        }

        if let Some(cached) = self.decisions.get(model) {
            debug!(model = %model, handler = cached.handler_name(), "Handler decision cache hit");
            return Ok(cached.clone());
        }

        debug!(model = %model, "Handler decision cache miss, scanning universe");
        let found = self.registry.first_for(model).cloned().or_else(|| self.default_for(model));

        let Some(capability) = found else {
            return Err(ViewbindError::HandlerNotFound {
                resolver: self.name.clone(),
                model: model.name().to_string(),
            });
        };

        debug!(model = %model, handler = capability.handler_name(), "Caching handler decision");
        self.decisions.insert(*model, capability.clone());
        Ok(capability)
    }

    /// Ask the default-handler hook, ignoring answers for another model type.
    fn default_for(&self, model: &ModelKey) -> Option<Capability> {
        let capability = self.defaults.as_ref()?.default_for(model)?;
        if capability.model() != *model {
            warn!(
                model = %model,
                handler = capability.handler_name(),
                serves = capability.model().name(),
                "Default handler hook returned a handler for another model type, ignoring it"
            );
            return None;
        }
        Some(capability)
    }
}

impl HandlerFactory for HandlerResolutionCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&self, model: &ModelKey) -> Result<ErasedHandler, ViewbindError> {
        let capability = self.decide(model)?;
        capability.activate().map_err(|err| ViewbindError::ActivationFailed {
            resolver: self.name.clone(),
            handler: capability.handler_name().to_string(),
            model: model.name().to_string(),
            reason: format!("{err:#}"),
        })
    }
}

impl std::fmt::Debug for HandlerResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerResolutionCache")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .field("has_defaults", &self.defaults.is_some())
            .field("cached", &self.decisions.len())
            .finish()
    }
}
