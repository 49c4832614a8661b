//! Test utilities for viewbind
//!
//! Helpers shared by unit tests and the integration tests under `tests/`:
//! - [`init_test_logging`] to see `tracing` output from a test
//! - [`TemplateDir`] for throwaway template roots with controllable
//!   modification times
//! - [`TemplateFixture`] for canned template sources
//!
//! # Example
//!
//! ```rust,no_run
//! use viewbind::test_utils::{TemplateDir, TemplateFixture};
//!
//! let dir = TemplateDir::new().unwrap();
//! dir.write_fixture(&TemplateFixture::greeting()).unwrap();
//! assert!(dir.path().join("greeting.tera").exists());
//! ```

pub mod fixtures;

pub use fixtures::{TemplateDir, TemplateFixture};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. Uses `level` if given, otherwise
/// `RUST_LOG` if set, otherwise leaves logging off.
///
/// ```bash
/// RUST_LOG=viewbind=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(true)
            .try_init();
    });
}
