//! Error handling for viewbind
//!
//! This module provides the error taxonomy shared by handler resolution and
//! template caching, plus user-friendly reporting for the CLI. The design
//! follows two principles:
//! 1. **Strongly-typed errors** so rendering hosts can decide per failure kind
//!    whether to show a diagnostic or render nothing
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Configuration**: [`ViewbindError::UniversalModelType`],
//!   [`ViewbindError::UnknownHandlerModule`], [`ViewbindError::ConfigError`]
//! - **Resolution**: [`ViewbindError::HandlerNotFound`],
//!   [`ViewbindError::ActivationFailed`]
//! - **Templates**: [`ViewbindError::TemplateParse`],
//!   [`ViewbindError::TemplateCompile`], [`ViewbindError::TemplateIo`],
//!   [`ViewbindError::TemplateRender`]
//!
//! None of these are retried by the library. A host that wants to retry does so
//! at its own level.
//!
//! # Examples
//!
//! ```rust,no_run
//! use viewbind::core::{ViewbindError, user_friendly_error};
//!
//! let error = ViewbindError::HandlerNotFound {
//!     resolver: "viewbind::configured".to_string(),
//!     model: "site::NewsList".to_string(),
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for viewbind operations
///
/// Every variant carries enough context to identify what was being resolved or
/// compiled: resolution errors name the resolver and the requested model type,
/// template errors name the canonical template path.
#[derive(Error, Debug)]
pub enum ViewbindError {
    /// Resolution was requested for a model type that every handler could satisfy
    ///
    /// Types such as `Box<dyn Any>` or `serde_json::Value` can stand for any
    /// model, so "the handler for it" has no meaning. This is a caller bug.
    #[error(
        "{resolver}: model type cannot be `{model}` because it would match any handler"
    )]
    UniversalModelType {
        /// Identity of the resolver that rejected the request
        resolver: String,
        /// The offending model type name
        model: String,
    },

    /// No discovered handler and no default handler exists for a model type
    #[error("{resolver} could not resolve any handler for model of type {model}")]
    HandlerNotFound {
        /// Identity of the resolver that failed
        resolver: String,
        /// The requested model type name
        model: String,
    },

    /// The selected handler could not be constructed
    #[error("{resolver} selected handler {handler} for model of type {model} but could not construct it: {reason}")]
    ActivationFailed {
        /// Identity of the resolver that failed
        resolver: String,
        /// Handler type name
        handler: String,
        /// The requested model type name
        model: String,
        /// Why construction failed
        reason: String,
    },

    /// Configuration names a handler module the catalog does not contain
    #[error("Handler module '{name}' is not registered (available: {})", available.join(", "))]
    UnknownHandlerModule {
        /// The requested module name
        name: String,
        /// Names of every module in the catalog
        available: Vec<String>,
    },

    /// Template source could not be parsed
    #[error("Unable to parse template {}: {message}{}", path.display(), format_location(*line, *column))]
    TemplateParse {
        /// Canonical path of the template
        path: PathBuf,
        /// Parser diagnostic
        message: String,
        /// 1-based line of the diagnostic, when known
        line: Option<usize>,
        /// 1-based column of the diagnostic, when known
        column: Option<usize>,
    },

    /// Template parsed but could not be compiled (e.g. a missing parent template)
    #[error("Unable to compile template {}: {message}", path.display())]
    TemplateCompile {
        /// Canonical path of the template
        path: PathBuf,
        /// Compiler diagnostic
        message: String,
    },

    /// Template file could not be read or stat'ed
    #[error("Failed to access template {}", path.display())]
    TemplateIo {
        /// The path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A compiled template instance failed while rendering
    #[error("Failed to render template {}: {message}", path.display())]
    TemplateRender {
        /// Canonical path of the template
        path: PathBuf,
        /// Renderer diagnostic
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },
}

fn format_location(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" (Line {line}:{column})"),
        (Some(line), None) => format!(" (Line {line})"),
        _ => String::new(),
    }
}

impl ViewbindError {
    /// Whether this error is one of the handler resolution failures a rendering
    /// host typically turns into a visible diagnostic outside production mode.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ViewbindError::HandlerNotFound { .. } | ViewbindError::ActivationFailed { .. }
        )
    }

    /// The template path this error concerns, if any.
    pub fn template_path(&self) -> Option<&std::path::Path> {
        match self {
            ViewbindError::TemplateParse { path, .. }
            | ViewbindError::TemplateCompile { path, .. }
            | ViewbindError::TemplateIo { path, .. }
            | ViewbindError::TemplateRender { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Error wrapper carrying a suggestion and additional details for display.
///
/// # Examples
///
/// ```rust,no_run
/// use viewbind::core::{ErrorContext, ViewbindError};
///
/// let context = ErrorContext::new(ViewbindError::ConfigError {
///     message: "templates.root is empty".to_string(),
/// })
/// .with_suggestion("Set templates.root in config.toml");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {:#}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// Looks through the `anyhow` chain for a [`ViewbindError`] first, then for
/// common I/O and TOML failures.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let suggestion = error.chain().find_map(|cause| {
        if let Some(err) = cause.downcast_ref::<ViewbindError>() {
            return Some(suggestion_for(err));
        }
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            return match io_error.kind() {
                std::io::ErrorKind::NotFound => Some((
                    "Check that the file or directory exists and the path is correct",
                    "A required file or directory could not be found",
                )),
                std::io::ErrorKind::PermissionDenied => Some((
                    "Check file ownership and permissions",
                    "viewbind does not have permission to read this file",
                )),
                _ => None,
            };
        }
        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return Some((
                "Check the TOML syntax in your config file. Verify quotes, brackets, and table names",
                "TOML parsing errors are usually caused by syntax issues",
            ));
        }
        None
    });

    match suggestion {
        Some((suggestion, details)) => {
            ErrorContext::new(error).with_suggestion(suggestion).with_details(details)
        }
        None => ErrorContext::new(error),
    }
}

fn suggestion_for(error: &ViewbindError) -> (&'static str, &'static str) {
    match error {
        ViewbindError::UniversalModelType { .. } => (
            "Request a concrete model type instead",
            "Resolving a handler for a type that can hold any value is ambiguous",
        ),
        ViewbindError::HandlerNotFound { .. } => (
            "Register a handler for this model in one of the configured handler modules, or add a default handler",
            "Handlers are discovered from the modules listed under [handlers] in the config",
        ),
        ViewbindError::ActivationFailed { .. } => (
            "Check the handler's constructor for failing preconditions",
            "The handler was found but its construction function returned an error",
        ),
        ViewbindError::UnknownHandlerModule { .. } => (
            "Fix the module name under [handlers].modules or register the module in the catalog",
            "Module names are matched exactly",
        ),
        ViewbindError::TemplateParse { .. } | ViewbindError::TemplateCompile { .. } => (
            "Fix the template source; the cache recompiles it automatically once the file changes",
            "The previously compiled version, if any, is kept until the template compiles again",
        ),
        ViewbindError::TemplateIo { .. } => (
            "Check that the template exists under the configured templates root",
            "Template paths without the configured extension have it appended",
        ),
        ViewbindError::TemplateRender { .. } => (
            "Check the variables the template expects against the supplied model",
            "Rendering failures are reported per call and never cached",
        ),
        ViewbindError::ConfigError { .. } => (
            "Review the viewbind config file",
            "Set VIEWBIND_CONFIG to point at a different config file",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_includes_location() {
        let err = ViewbindError::TemplateParse {
            path: PathBuf::from("/views/news.tera"),
            message: "unexpected token".to_string(),
            line: Some(3),
            column: Some(7),
        };
        assert_eq!(
            err.to_string(),
            "Unable to parse template /views/news.tera: unexpected token (Line 3:7)"
        );
        assert_eq!(err.template_path(), Some(std::path::Path::new("/views/news.tera")));
    }

    #[test]
    fn test_handler_not_found_names_resolver_and_model() {
        let err = ViewbindError::HandlerNotFound {
            resolver: "test-resolver".to_string(),
            model: "app::Baz".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("test-resolver"));
        assert!(message.contains("app::Baz"));
        assert!(err.is_resolution_failure());
    }

    #[test]
    fn test_user_friendly_error_finds_nested_viewbind_error() {
        let err = anyhow::Error::from(ViewbindError::ConfigError {
            message: "bad".to_string(),
        })
        .context("while loading");
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.is_some());
        assert!(ctx.to_string().contains("while loading"));
    }

    #[test]
    fn test_user_friendly_error_without_known_cause() {
        let ctx = user_friendly_error(anyhow::anyhow!("something else"));
        assert!(ctx.suggestion.is_none());
        assert!(ctx.details.is_none());
    }
}
