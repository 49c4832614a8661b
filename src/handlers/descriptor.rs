//! Statically-typed handler descriptions.
//!
//! A [`HandlerDescriptor`] is what the handler universe is made of: the name of
//! a concrete handler type plus one [`Capability`] per model type it handles.
//! Each capability carries the construction function that produces a boxed
//! `dyn Handler<M>`, resolved once when the handler is registered.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use super::view::Handler;
use crate::core::ModelKey;

type Construct<H> = Arc<dyn Fn() -> anyhow::Result<H> + Send + Sync>;
type Activator = Arc<dyn Fn() -> anyhow::Result<ErasedHandler> + Send + Sync>;

/// A constructed handler whose model type has been erased.
///
/// Holds a `Box<dyn Handler<M>>` for the `M` of the capability that built it.
pub struct ErasedHandler {
    handler: &'static str,
    inner: Box<dyn Any + Send>,
}

impl ErasedHandler {
    fn new<M: 'static>(handler: &'static str, boxed: Box<dyn Handler<M>>) -> Self {
        Self {
            handler,
            inner: Box::new(boxed),
        }
    }

    /// Name of the concrete handler type.
    pub fn handler_name(&self) -> &'static str {
        self.handler
    }

    /// Recover the typed handler. Fails with `self` if it was built for a
    /// different model type.
    pub fn downcast<M: 'static>(self) -> Result<Box<dyn Handler<M>>, Self> {
        let handler = self.handler;
        self.inner
            .downcast::<Box<dyn Handler<M>>>()
            .map(|boxed| *boxed)
            .map_err(|inner| Self { handler, inner })
    }
}

impl fmt::Debug for ErasedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedHandler")
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// "Handler type `H` can produce models of type `M`", with the means to build one.
#[derive(Clone)]
pub struct Capability {
    handler: &'static str,
    model: ModelKey,
    activate: Activator,
}

impl Capability {
    /// Capability of handler `H` for model `M`, built by `construct`.
    pub fn new<M, H, F>(construct: F) -> Self
    where
        M: 'static,
        H: Handler<M> + 'static,
        F: Fn() -> anyhow::Result<H> + Send + Sync + 'static,
    {
        Self::from_shared::<M, H>(Arc::new(construct))
    }

    fn from_shared<M, H>(construct: Construct<H>) -> Self
    where
        M: 'static,
        H: Handler<M> + 'static,
    {
        let handler = type_name::<H>();
        Self {
            handler,
            model: ModelKey::of::<M>(),
            activate: Arc::new(move || {
                let boxed: Box<dyn Handler<M>> = Box::new(construct()?);
                Ok(ErasedHandler::new(handler, boxed))
            }),
        }
    }

    /// Name of the concrete handler type.
    pub fn handler_name(&self) -> &'static str {
        self.handler
    }

    /// The model type this capability serves.
    pub fn model(&self) -> ModelKey {
        self.model
    }

    /// Construct a new handler instance.
    pub fn activate(&self) -> anyhow::Result<ErasedHandler> {
        (self.activate)()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("handler", &self.handler)
            .field("model", &self.model.name())
            .finish()
    }
}

/// A concrete handler type and every model type it handles.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    name: &'static str,
    capabilities: Vec<Capability>,
}

impl HandlerDescriptor {
    /// Describe handler `H`, constructed by `construct`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use viewbind::core::ModelKey;
    /// use viewbind::handlers::{Handler, HandlerDescriptor, ViewContext};
    ///
    /// struct Teaser;
    /// struct TeaserHandler { limit: usize }
    ///
    /// impl Handler<Teaser> for TeaserHandler {
    ///     fn model(&self, _view: &dyn ViewContext) -> Option<Teaser> {
    ///         (self.limit > 0).then_some(Teaser)
    ///     }
    /// }
    ///
    /// let descriptor = HandlerDescriptor::builder(|| Ok(TeaserHandler { limit: 3 }))
    ///     .handles::<Teaser>()
    ///     .build();
    /// assert!(descriptor.handles(&ModelKey::of::<Teaser>()));
    /// ```
    pub fn builder<H, F>(construct: F) -> DescriptorBuilder<H>
    where
        H: Send + 'static,
        F: Fn() -> anyhow::Result<H> + Send + Sync + 'static,
    {
        DescriptorBuilder {
            construct: Arc::new(construct),
            capabilities: Vec::new(),
        }
    }

    /// Describe handler `H`, constructed with [`Default`].
    pub fn of_default<H>() -> DescriptorBuilder<H>
    where
        H: Default + Send + 'static,
    {
        Self::builder(|| Ok(H::default()))
    }

    /// Name of the concrete handler type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Every capability, in declaration order.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// The capability serving `model`, if this handler has one.
    pub fn capability_for(&self, model: &ModelKey) -> Option<&Capability> {
        self.capabilities.iter().find(|capability| capability.model == *model)
    }

    /// Whether this handler can produce models of type `model`.
    pub fn handles(&self, model: &ModelKey) -> bool {
        self.capability_for(model).is_some()
    }
}

/// Builder returned by [`HandlerDescriptor::builder`].
pub struct DescriptorBuilder<H> {
    construct: Construct<H>,
    capabilities: Vec<Capability>,
}

impl<H: Send + 'static> DescriptorBuilder<H> {
    /// Declare that `H` handles model type `M`.
    pub fn handles<M: 'static>(mut self) -> Self
    where
        H: Handler<M>,
    {
        let capability = Capability::from_shared::<M, H>(Arc::clone(&self.construct));
        self.capabilities.push(capability);
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> HandlerDescriptor {
        HandlerDescriptor {
            name: type_name::<H>(),
            capabilities: self.capabilities,
        }
    }
}
