//! Fallback handlers for models no discovered handler serves.

use std::collections::HashMap;

use super::descriptor::Capability;
use super::view::Handler;
use crate::core::ModelKey;

/// Supplies a fallback handler for a model type, or nothing.
///
/// Consulted by the resolution cache only after the universe scan found no
/// match. Closures of the right shape implement this trait directly.
pub trait DefaultHandlers: Send + Sync {
    /// The fallback capability for `model`, if any.
    fn default_for(&self, model: &ModelKey) -> Option<Capability>;
}

impl<F> DefaultHandlers for F
where
    F: Fn(&ModelKey) -> Option<Capability> + Send + Sync,
{
    fn default_for(&self, model: &ModelKey) -> Option<Capability> {
        self(model)
    }
}

/// A fixed table of fallback handlers keyed by model type.
///
/// # Examples
///
/// ```rust
/// use viewbind::core::ModelKey;
/// use viewbind::handlers::{DefaultHandlerTable, DefaultHandlers, Handler, ViewContext};
///
/// struct Breadcrumbs;
/// #[derive(Default)]
/// struct EmptyBreadcrumbs;
///
/// impl Handler<Breadcrumbs> for EmptyBreadcrumbs {
///     fn model(&self, _view: &dyn ViewContext) -> Option<Breadcrumbs> {
///         None
///     }
/// }
///
/// let defaults = DefaultHandlerTable::new().with::<Breadcrumbs, EmptyBreadcrumbs>();
/// assert!(defaults.default_for(&ModelKey::of::<Breadcrumbs>()).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultHandlerTable {
    entries: HashMap<ModelKey, Capability>,
}

impl DefaultHandlerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `H`, built with [`Default`], as the fallback for `M`.
    pub fn with<M, H>(self) -> Self
    where
        M: 'static,
        H: Handler<M> + Default + 'static,
    {
        self.with_capability(Capability::new::<M, H, _>(|| Ok(H::default())))
    }

    /// Use `capability` as the fallback for its model type, replacing any
    /// earlier fallback for that model.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.entries.insert(capability.model(), capability);
        self
    }

    /// Number of model types with a fallback.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefaultHandlers for DefaultHandlerTable {
    fn default_for(&self, model: &ModelKey) -> Option<Capability> {
        self.entries.get(model).cloned()
    }
}
