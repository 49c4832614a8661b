//! viewbind - presenter resolution and compiled template caching for
//! server-rendered views
//!
//! A templated view needs two things at render time: a *handler* that knows
//! how to produce its view-model, and a *compiled template* to render the model
//! with. Both are expensive to find or build and both are requested on every
//! render, from many threads at once. This crate caches both.
//!
//! # Architecture Overview
//!
//! ```text
//! ViewEngine::render::<M>(template, view)
//!   ├─ ResolverSlot ── HandlerResolutionCache ── HandlerRegistry ── ModuleCatalog
//!   │      "the handler for M"   (decision cache)    (universe, once)   (discovery units)
//!   └─ TemplateCache ── KeyedLock (one compile per path)
//!          "the compiled template at P"  (mtime invalidation)
//! ```
//!
//! - **Handler resolution**: handlers declare the model types they serve. The
//!   first handler found for a model type wins, falling back to a default
//!   handler hook, and the decision is cached for the life of the resolver.
//! - **Template caching**: templates are compiled once and reused until the
//!   file's modification time changes. Concurrent requests for the same path
//!   compile it once; different paths never block each other.
//!
//! # Core Modules
//!
//! - [`cache`] - [`KeyedLock`](cache::KeyedLock), per-key mutual exclusion
//! - [`cli`] - the `viewbind` command-line tool
//! - [`config`] - TOML configuration
//! - [`core`] - error types and the model type key
//! - [`engine`] - [`ViewEngine`](engine::ViewEngine), the rendering context
//! - [`handlers`] - handler discovery and resolution
//! - [`templating`] - template compilation and caching
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Compile every template under the configured root
//! viewbind check
//!
//! # Render a template with a JSON model
//! viewbind render ~/news/list --data list.json
//! ```

// Core functionality modules
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;

// View rendering
pub mod engine;
pub mod handlers;
pub mod templating;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
