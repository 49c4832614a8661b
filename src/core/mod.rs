//! Core types for viewbind
//!
//! This module holds the pieces every other module builds on:
//!
//! ## `error` - Error Handling
//! - [`ViewbindError`] - Enumerated failures of resolution and template caching
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format
//!
//! ## `model` - Capability Markers
//! - [`ModelKey`] - Identifies "a handler for model type `M`"
//!
//! # Examples
//!
//! ```rust
//! use viewbind::core::{ModelKey, ViewbindError};
//!
//! struct NewsList;
//!
//! let key = ModelKey::of::<NewsList>();
//! assert!(!key.is_universal());
//!
//! let err = ViewbindError::HandlerNotFound {
//!     resolver: "example".to_string(),
//!     model: key.name().to_string(),
//! };
//! assert!(err.is_resolution_failure());
//! ```

pub mod error;
pub mod model;

pub use error::{ErrorContext, ViewbindError, user_friendly_error};
pub use model::ModelKey;
