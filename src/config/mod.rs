//! Configuration for viewbind.
//!
//! Settings live in a single TOML file (see [`ViewbindConfig`] for its location and
//! format). Two sections matter:
//!
//! - `[templates]` - where templates live and how they compile ([`TemplatesConfig`])
//! - `[handlers]` - which handler modules are discovered and what the
//!   configured resolver calls itself ([`HandlersConfig`])
//!
//! Configuration is read once at startup. Handler module selection in
//! particular cannot change after discovery has happened; to apply a new
//! selection, build a new resolver and swap it in with
//! [`ResolverSlot::replace`](crate::handlers::ResolverSlot::replace).

mod global;

pub use global::{CONFIG_ENV, HandlersConfig, TemplatesConfig, ViewbindConfig};
