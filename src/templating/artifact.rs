//! Compiled templates and the per-call instances made from them.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::{Context as TeraContext, Tera};

use super::compiler::describe_tera_error;
use crate::core::ViewbindError;

/// Name under which [`TemplateInstance::set_model`] exposes the view-model.
pub const MODEL_KEY: &str = "model";

/// A template that compiled successfully.
///
/// Shared read-only between every caller that asked the cache for the same
/// file. Rendering state lives in a [`TemplateInstance`], never here.
pub struct CompiledTemplate {
    tera: Tera,
    name: String,
    path: PathBuf,
}

impl CompiledTemplate {
    pub(crate) fn new(tera: Tera, name: String, path: PathBuf) -> Self {
        Self { tera, name, path }
    }

    /// Canonical path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh instance with an empty context.
    pub fn instance(self: &Arc<Self>) -> TemplateInstance {
        TemplateInstance {
            template: Arc::clone(self),
            context: TeraContext::new(),
        }
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate").field("path", &self.path).finish_non_exhaustive()
    }
}

/// One execution of a compiled template.
///
/// # Examples
///
/// ```rust,no_run
/// use serde::Serialize;
/// use viewbind::templating::{TemplateCache, TemplateLocator, TeraCompiler};
///
/// #[derive(Serialize)]
/// struct Headline {
///     title: String,
/// }
///
/// let cache = TemplateCache::new(TeraCompiler::default(), TemplateLocator::new("/srv/views"));
/// let template = cache.get_compiled("~/news/headline")?;
///
/// let mut instance = template.instance();
/// instance.set_model(&Headline { title: "Launch".into() })?;
/// instance.insert("edition", &"morning")?;
/// println!("{}", instance.render()?);
/// # Ok::<(), viewbind::core::ViewbindError>(())
/// ```
#[derive(Debug)]
pub struct TemplateInstance {
    template: Arc<CompiledTemplate>,
    context: TeraContext,
}

impl TemplateInstance {
    /// Bind the view-model, available to the template as `model`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::TemplateRender`] if the model cannot be
    /// serialized into template values.
    pub fn set_model<M: Serialize + ?Sized>(&mut self, model: &M) -> Result<&mut Self, ViewbindError> {
        self.insert(MODEL_KEY, model)
    }

    /// Bind an additional variable.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::TemplateRender`] if the value cannot be
    /// serialized into template values.
    pub fn insert<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self, ViewbindError> {
        let key = key.into();
        self.context.try_insert(key.clone(), value).map_err(|e| ViewbindError::TemplateRender {
            path: self.template.path.clone(),
            message: format!("cannot bind '{key}': {}", describe_tera_error(&e, &self.template.name)),
        })?;
        Ok(self)
    }

    /// The template this instance executes.
    pub fn template(&self) -> &Arc<CompiledTemplate> {
        &self.template
    }

    /// Execute the template against the bound variables.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::TemplateRender`] if execution fails, e.g.
    /// on an undefined variable.
    pub fn render(&self) -> Result<String, ViewbindError> {
        let template = &self.template;
        template.tera.render(&template.name, &self.context).map_err(|e| {
            ViewbindError::TemplateRender {
                path: template.path.clone(),
                message: describe_tera_error(&e, &template.name),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::compiler::{TemplateCompiler, TeraCompiler};
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Headline {
        title: &'static str,
    }

    fn compiled(source: &str, autoescape: bool) -> Arc<CompiledTemplate> {
        Arc::new(
            TeraCompiler::new(autoescape)
                .compile(source, Path::new("/views/headline.tera"))
                .unwrap(),
        )
    }

    #[test]
    fn test_render_with_model_and_variables() {
        let template = compiled("{{ edition }}: {{ model.title }}", true);
        let mut instance = template.instance();
        instance.set_model(&Headline { title: "Launch" }).unwrap();
        instance.insert("edition", "Morning").unwrap();

        assert_eq!(instance.render().unwrap(), "Morning: Launch");
    }

    #[test]
    fn test_instances_do_not_share_context() {
        let template = compiled("{{ model.title }}", true);

        let mut first = template.instance();
        first.set_model(&Headline { title: "first" }).unwrap();
        let mut second = template.instance();
        second.set_model(&Headline { title: "second" }).unwrap();

        assert_eq!(first.render().unwrap(), "first");
        assert_eq!(second.render().unwrap(), "second");
        assert!(Arc::ptr_eq(first.template(), second.template()));
    }

    #[test]
    fn test_autoescape_setting() {
        let model = Headline { title: "<b>bold</b>" };

        let mut escaped = compiled("{{ model.title }}", true).instance();
        escaped.set_model(&model).unwrap();
        assert_eq!(escaped.render().unwrap(), "&lt;b&gt;bold&lt;&#x2F;b&gt;");

        let mut raw = compiled("{{ model.title }}", false).instance();
        raw.set_model(&model).unwrap();
        assert_eq!(raw.render().unwrap(), "<b>bold</b>");
    }

    #[test]
    fn test_undefined_variable_is_render_error() {
        let instance = compiled("{{ model.title }}", true).instance();
        let err = instance.render().unwrap_err();
        match err {
            ViewbindError::TemplateRender { path, .. } => {
                assert_eq!(path, PathBuf::from("/views/headline.tera"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unserializable_model_is_rejected() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], "non-string keys cannot become template objects");

        let mut instance = compiled("{{ model }}", true).instance();
        assert!(matches!(
            instance.set_model(&bad),
            Err(ViewbindError::TemplateRender { .. })
        ));
    }
}
