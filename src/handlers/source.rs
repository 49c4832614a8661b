//! Handler discovery sources.
//!
//! A [`HandlerSource`] produces the handler universe in discovery units. Units
//! fail independently: a failing unit is reported alongside whatever handlers it
//! managed to register, and the other units are unaffected.
//!
//! [`ModuleCatalog`] is the standard source. Applications describe their
//! handlers in named [`HandlerModule`]s, each a registration function, and
//! collect the modules into a catalog at startup:
//!
//! ```rust
//! use viewbind::handlers::{Handler, HandlerDescriptor, HandlerModule, ModuleCatalog, ViewContext};
//!
//! struct Menu;
//! #[derive(Default)]
//! struct MenuHandler;
//!
//! impl Handler<Menu> for MenuHandler {
//!     fn model(&self, _view: &dyn ViewContext) -> Option<Menu> {
//!         Some(Menu)
//!     }
//! }
//!
//! let catalog = ModuleCatalog::new().with_module(HandlerModule::new("navigation", |registrar| {
//!     registrar.register(HandlerDescriptor::of_default::<MenuHandler>().handles::<Menu>().build());
//!     Ok(())
//! }));
//! assert_eq!(catalog.names(), vec!["navigation"]);
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::descriptor::HandlerDescriptor;
use crate::core::ViewbindError;

/// The outcome of discovering one unit.
#[derive(Debug)]
pub struct DiscoveryUnit {
    /// Unit name, for diagnostics
    pub name: String,
    /// Handlers the unit produced, in registration order
    pub handlers: Vec<HandlerDescriptor>,
    /// Set when the unit failed; `handlers` then holds what it produced before failing
    pub error: Option<anyhow::Error>,
}

/// Supplies the handler universe.
pub trait HandlerSource: Send + Sync {
    /// Discover every unit, in a fixed order.
    fn discover(&self) -> Vec<DiscoveryUnit>;
}

impl HandlerSource for Vec<HandlerDescriptor> {
    fn discover(&self) -> Vec<DiscoveryUnit> {
        vec![DiscoveryUnit {
            name: "static".to_string(),
            handlers: self.clone(),
            error: None,
        }]
    }
}

/// Collects the handlers a module registers.
#[derive(Debug, Default)]
pub struct ModuleRegistrar {
    handlers: Vec<HandlerDescriptor>,
}

impl ModuleRegistrar {
    /// Add a handler to the universe.
    pub fn register(&mut self, descriptor: HandlerDescriptor) -> &mut Self {
        self.handlers.push(descriptor);
        self
    }
}

type RegisterFn = Arc<dyn Fn(&mut ModuleRegistrar) -> anyhow::Result<()> + Send + Sync>;

/// A named group of handler registrations.
#[derive(Clone)]
pub struct HandlerModule {
    name: String,
    register: RegisterFn,
}

impl HandlerModule {
    /// Create a module from its registration function.
    pub fn new<F>(name: impl Into<String>, register: F) -> Self
    where
        F: Fn(&mut ModuleRegistrar) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            register: Arc::new(register),
        }
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the registration function.
    ///
    /// A registration function that panics is reported as a failed unit.
    pub fn load(&self) -> DiscoveryUnit {
        let mut registrar = ModuleRegistrar::default();
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.register)(&mut registrar)));

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(_) => Some(anyhow::anyhow!("module '{}' panicked during registration", self.name)),
        };

        DiscoveryUnit {
            name: self.name.clone(),
            handlers: registrar.handlers,
            error,
        }
    }
}

impl fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerModule").field("name", &self.name).finish_non_exhaustive()
    }
}

/// An ordered set of handler modules.
///
/// Discovery order is module order, then registration order inside each module.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<HandlerModule>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module.
    pub fn with_module(mut self, module: HandlerModule) -> Self {
        self.modules.push(module);
        self
    }

    /// Module names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(HandlerModule::name).collect()
    }

    /// Restrict the catalog to the named modules, in the order given.
    ///
    /// An empty selection keeps every module.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::UnknownHandlerModule`] for the first name that
    /// is not in the catalog.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, ViewbindError> {
        if names.is_empty() {
            return Ok(self.clone());
        }

        let modules = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.modules.iter().find(|module| module.name == name).cloned().ok_or_else(|| {
                    ViewbindError::UnknownHandlerModule {
                        name: name.to_string(),
                        available: self.names().into_iter().map(str::to_string).collect(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            modules,
        })
    }
}

impl HandlerSource for ModuleCatalog {
    fn discover(&self) -> Vec<DiscoveryUnit> {
        self.modules.iter().map(HandlerModule::load).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::view::{Handler, ViewContext};

    struct Page;

    #[derive(Default)]
    struct PageHandler;

    impl Handler<Page> for PageHandler {
        fn model(&self, _view: &dyn ViewContext) -> Option<Page> {
            Some(Page)
        }
    }

    fn page_handler() -> HandlerDescriptor {
        HandlerDescriptor::of_default::<PageHandler>().handles::<Page>().build()
    }

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new()
            .with_module(HandlerModule::new("core", |registrar| {
                registrar.register(page_handler());
                Ok(())
            }))
            .with_module(HandlerModule::new("extras", |_| Ok(())))
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let selected = catalog().select(&["extras", "core"]).unwrap();
        assert_eq!(selected.names(), vec!["extras", "core"]);

        let all = catalog().select::<&str>(&[]).unwrap();
        assert_eq!(all.names(), vec!["core", "extras"]);
    }

    #[test]
    fn test_select_unknown_module() {
        let err = catalog().select(&["missing"]).unwrap_err();
        match err {
            ViewbindError::UnknownHandlerModule {
                name,
                available,
            } => {
                assert_eq!(name, "missing");
                assert_eq!(available, vec!["core", "extras"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_module_keeps_registered_handlers() {
        let module = HandlerModule::new("half", |registrar| {
            registrar.register(page_handler());
            anyhow::bail!("second handler failed to load")
        });

        let unit = module.load();
        assert_eq!(unit.name, "half");
        assert_eq!(unit.handlers.len(), 1);
        assert!(unit.error.is_some());
    }

    #[test]
    fn test_panicking_module_is_a_failed_unit() {
        let module = HandlerModule::new("broken", |_| panic!("bad registration"));
        let unit = module.load();
        assert!(unit.handlers.is_empty());
        assert!(unit.error.unwrap().to_string().contains("broken"));
    }
}
