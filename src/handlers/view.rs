//! The view side of the handler contract.

use std::collections::HashMap;

/// What a handler can see of the view it produces a model for.
pub trait ViewContext: Send + Sync {
    /// Name of the view, for diagnostics.
    fn name(&self) -> &str;

    /// Data source path or query passed to the view by the rendering host, if any.
    fn data_source(&self) -> Option<&str>;

    /// A named rendering property of the view.
    fn property(&self, name: &str) -> Option<&str>;
}

/// A handler produces the view-model of type `M` for a view.
///
/// Returning `None` means there is nothing to display; whether that shows up
/// as a diagnostic or as blank output is up to the rendering host.
///
/// # Examples
///
/// ```rust
/// use viewbind::handlers::{Handler, View, ViewContext};
///
/// struct Greeting(String);
///
/// #[derive(Default)]
/// struct GreetingHandler;
///
/// impl Handler<Greeting> for GreetingHandler {
///     fn model(&self, view: &dyn ViewContext) -> Option<Greeting> {
///         view.property("name").map(|name| Greeting(format!("Hello, {name}")))
///     }
/// }
///
/// let view = View::new("greeting").with_property("name", "Ada");
/// let model = GreetingHandler.model(&view).unwrap();
/// assert_eq!(model.0, "Hello, Ada");
/// ```
pub trait Handler<M>: Send {
    /// Produce the model for `view`.
    fn model(&self, view: &dyn ViewContext) -> Option<M>;
}

/// A plain [`ViewContext`] value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    name: String,
    data_source: Option<String>,
    properties: HashMap<String, String>,
}

impl View {
    /// Create a view with no data source and no properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the data source. Blank values are treated as absent.
    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        let data_source = data_source.into();
        self.data_source = (!data_source.trim().is_empty()).then_some(data_source);
        self
    }

    /// Add a rendering property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

impl ViewContext for View {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_source(&self) -> Option<&str> {
        self.data_source.as_deref()
    }

    fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_data_source_is_absent() {
        let view = View::new("list").with_data_source("   ");
        assert_eq!(view.data_source(), None);

        let view = View::new("list").with_data_source("/home/news");
        assert_eq!(view.data_source(), Some("/home/news"));
    }

    #[test]
    fn test_properties() {
        let view = View::new("list").with_property("limit", "5");
        assert_eq!(view.name(), "list");
        assert_eq!(view.property("limit"), Some("5"));
        assert_eq!(view.property("missing"), None);
    }
}
