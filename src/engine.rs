//! The rendering context a host threads through its views.
//!
//! [`ViewEngine`] owns the two caches a templated view needs: the current
//! handler resolver and the compiled template cache. Hosts usually build one at
//! startup with [`ViewEngine::from_config`] and share it behind an `Arc`.

use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::config::ViewbindConfig;
use crate::core::ViewbindError;
use crate::handlers::{ModuleCatalog, ResolverSlot, ViewContext};
use crate::templating::TemplateCache;

/// Handler resolution plus template caching for one rendering host.
///
/// # Examples
///
/// ```rust,no_run
/// use serde::Serialize;
/// use viewbind::config::ViewbindConfig;
/// use viewbind::engine::ViewEngine;
/// use viewbind::handlers::{Handler, HandlerDescriptor, HandlerModule, ModuleCatalog, View, ViewContext};
///
/// #[derive(Serialize)]
/// struct Headline {
///     title: String,
/// }
///
/// #[derive(Default)]
/// struct HeadlineHandler;
///
/// impl Handler<Headline> for HeadlineHandler {
///     fn model(&self, view: &dyn ViewContext) -> Option<Headline> {
///         view.property("title").map(|title| Headline { title: title.to_string() })
///     }
/// }
///
/// # async fn example() -> anyhow::Result<()> {
/// let catalog = ModuleCatalog::new().with_module(HandlerModule::new("news", |registrar| {
///     registrar.register(HandlerDescriptor::of_default::<HeadlineHandler>().handles::<Headline>().build());
///     Ok(())
/// }));
///
/// let engine = ViewEngine::from_config(&ViewbindConfig::load().await?, &catalog)?;
/// let view = View::new("headline").with_property("title", "Launch");
/// if let Some(html) = engine.render::<Headline>("~/news/headline", &view)? {
///     println!("{html}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ViewEngine {
    resolvers: ResolverSlot,
    templates: TemplateCache,
}

impl ViewEngine {
    /// An engine from its parts.
    pub fn new(resolvers: ResolverSlot, templates: TemplateCache) -> Self {
        Self {
            resolvers,
            templates,
        }
    }

    /// An engine configured from `config`, discovering handlers in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::UnknownHandlerModule`] if the configuration
    /// selects a module the catalog lacks, or [`ViewbindError::ConfigError`] if
    /// the template root cannot be expanded.
    pub fn from_config(config: &ViewbindConfig, catalog: &ModuleCatalog) -> Result<Self, ViewbindError> {
        Ok(Self::new(
            ResolverSlot::configured(&config.handlers, catalog)?,
            TemplateCache::from_config(&config.templates)?,
        ))
    }

    /// The current resolver slot, for replacing the resolver.
    pub fn resolvers(&self) -> &ResolverSlot {
        &self.resolvers
    }

    /// The template cache.
    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Render `template` for `view` with the model of type `M`.
    ///
    /// Resolves the handler for `M`, asks it for the model, and renders a fresh
    /// instance of the template with the model bound as `model` and the view
    /// as `view` (`name`, `data_source`). Returns `Ok(None)` when the handler
    /// has no model for this view; the template is not compiled in that case.
    ///
    /// # Errors
    ///
    /// Any resolution error from [`ResolverSlot::resolve`], or any template
    /// error from [`TemplateCache::get_compiled`] and rendering.
    pub fn render<M: Serialize + 'static>(
        &self,
        template: impl AsRef<Path>,
        view: &dyn ViewContext,
    ) -> Result<Option<String>, ViewbindError> {
        let handler = self.resolvers.resolve::<M>()?;
        let Some(model) = handler.model(view) else {
            debug!(view = view.name(), "Handler produced no model, nothing to render");
            return Ok(None);
        };

        let compiled = self.templates.get_compiled(template)?;
        let mut instance = compiled.instance();
        instance.set_model(&model)?.insert(
            "view",
            &serde_json::json!({
                "name": view.name(),
                "data_source": view.data_source(),
            }),
        )?;

        instance.render().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{Handler, HandlerDescriptor, HandlerResolutionCache, View};
    use crate::templating::{TemplateLocator, TeraCompiler};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Headline {
        title: String,
    }

    #[derive(Default)]
    struct HeadlineHandler;

    impl Handler<Headline> for HeadlineHandler {
        fn model(&self, view: &dyn ViewContext) -> Option<Headline> {
            view.property("title").map(|title| Headline {
                title: title.to_string(),
            })
        }
    }

    struct Unhandled;

    impl Serialize for Unhandled {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_unit()
        }
    }

    fn engine(root: &Path) -> ViewEngine {
        let resolver = HandlerResolutionCache::new(
            "test",
            vec![HandlerDescriptor::of_default::<HeadlineHandler>().handles::<Headline>().build()],
        );
        ViewEngine::new(
            ResolverSlot::with_resolver(Arc::new(resolver)),
            TemplateCache::new(TeraCompiler::default(), TemplateLocator::new(root).with_extension("tera")),
        )
    }

    #[test]
    fn test_render_binds_model_and_view() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("headline.tera"), "{{ view.name }}: {{ model.title }}").unwrap();
        let engine = engine(temp.path());

        let view = View::new("lead").with_property("title", "Launch");
        let html = engine.render::<Headline>("~/headline", &view).unwrap();
        assert_eq!(html.as_deref(), Some("lead: Launch"));
    }

    #[test]
    fn test_no_model_renders_nothing() {
        let temp = TempDir::new().unwrap();
        let engine = engine(temp.path());

        // The template does not exist; it must not be touched.
        let html = engine.render::<Headline>("~/absent", &View::new("lead")).unwrap();
        assert!(html.is_none());
        assert!(engine.templates().is_empty());
    }

    #[test]
    fn test_unresolvable_model_is_an_error() {
        let temp = TempDir::new().unwrap();
        let engine = engine(temp.path());

        let err = engine.render::<Unhandled>("~/headline", &View::new("lead")).unwrap_err();
        assert!(err.is_resolution_failure());
    }
}
