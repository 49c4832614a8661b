//! Server-side template compilation and caching.
//!
//! A rendering host asks [`TemplateCache::get_compiled`] for a template path
//! once per render, then creates a [`TemplateInstance`] from the returned
//! [`CompiledTemplate`], binds the view-model, and renders it.
//!
//! # Modules
//!
//! - `compiler` - [`TemplateCompiler`] abstraction and the Tera implementation
//! - `locator` - request path translation and canonicalization
//! - `cache` - the compiled template cache
//! - `artifact` - compiled templates and per-call instances
//!
//! # Template Syntax
//!
//! Templates are [Tera](https://keats.github.io/tera/docs/) templates. The
//! view-model is available as `model`:
//!
//! ```text
//! <h1>{{ model.title }}</h1>
//! {% for item in model.items %}
//!   <li>{{ item.headline }}</li>
//! {% endfor %}
//! ```
//!
//! Each file compiles on its own; `{% extends %}` and `{% include %}` of other
//! files are reported as compile errors.

mod artifact;
mod cache;
mod compiler;
mod locator;

pub use artifact::{CompiledTemplate, MODEL_KEY, TemplateInstance};
pub use cache::{CacheStats, TemplateCache};
pub use compiler::{CompileFailure, FailureKind, TemplateCompiler, TeraCompiler};
pub use locator::TemplateLocator;
