//! Handler resolution: finding the object that produces a view-model.
//!
//! A view that renders a model of type `M` asks for "the handler for `M`". The
//! pieces involved, leaf first:
//!
//! - [`Handler`] / [`ViewContext`]: the contract between a handler and its view
//! - [`HandlerDescriptor`] / [`Capability`]: a concrete handler type, the model
//!   types it serves, and how to construct it
//! - [`HandlerSource`] / [`ModuleCatalog`]: where the universe of handlers comes
//!   from; discovery units fail independently
//! - [`HandlerRegistry`]: the universe, discovered once
//! - [`DefaultHandlers`]: fallback handlers for models nothing else serves
//! - [`HandlerResolutionCache`]: picks one handler per model type, caches the
//!   decision, constructs instances on demand
//! - [`ResolverSlot`]: the replaceable current resolver
//!
//! # Example
//!
//! ```rust
//! use viewbind::handlers::{
//!     Handler, HandlerDescriptor, HandlerModule, ModuleCatalog, ResolverSlot, View, ViewContext,
//! };
//! use viewbind::config::HandlersConfig;
//!
//! struct NewsList {
//!     source: String,
//! }
//!
//! #[derive(Default)]
//! struct NewsListHandler;
//!
//! impl Handler<NewsList> for NewsListHandler {
//!     fn model(&self, view: &dyn ViewContext) -> Option<NewsList> {
//!         view.data_source().map(|source| NewsList { source: source.to_string() })
//!     }
//! }
//!
//! let catalog = ModuleCatalog::new().with_module(HandlerModule::new("news", |registrar| {
//!     registrar.register(HandlerDescriptor::of_default::<NewsListHandler>().handles::<NewsList>().build());
//!     Ok(())
//! }));
//!
//! let slot = ResolverSlot::configured(&HandlersConfig::default(), &catalog)?;
//! let handler = slot.resolve::<NewsList>()?;
//! let model = handler.model(&View::new("news").with_data_source("/home/news")).unwrap();
//! assert_eq!(model.source, "/home/news");
//! # Ok::<(), viewbind::core::ViewbindError>(())
//! ```

pub mod defaults;
pub mod descriptor;
pub mod registry;
pub mod resolution;
pub mod resolver;
pub mod source;
pub mod view;

pub use defaults::{DefaultHandlerTable, DefaultHandlers};
pub use descriptor::{Capability, DescriptorBuilder, ErasedHandler, HandlerDescriptor};
pub use registry::HandlerRegistry;
pub use resolution::{
    DEFAULT_RESOLVER_NAME, HandlerFactory, HandlerFactoryExt, HandlerResolutionCache,
};
pub use resolver::ResolverSlot;
pub use source::{DiscoveryUnit, HandlerModule, HandlerSource, ModuleCatalog, ModuleRegistrar};
pub use view::{Handler, View, ViewContext};
