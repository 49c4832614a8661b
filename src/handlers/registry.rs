//! The handler universe.
//!
//! [`HandlerRegistry`] discovers the set of candidate handlers from its
//! [`HandlerSource`] the first time it is needed and keeps it for its whole
//! lifetime. Discovery runs at most once, even when many threads ask for the
//! universe at the same moment; once it has completed, readers never block.

use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::descriptor::{Capability, HandlerDescriptor};
use super::source::HandlerSource;
use crate::core::ModelKey;

/// Lazily discovered, immutable set of handler descriptors.
pub struct HandlerRegistry {
    source: Box<dyn HandlerSource>,
    universe: OnceLock<Vec<HandlerDescriptor>>,
}

impl HandlerRegistry {
    /// Create a registry over `source`. Nothing is discovered yet.
    pub fn new(source: impl HandlerSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            universe: OnceLock::new(),
        }
    }

    /// Every discovered handler, in discovery order.
    ///
    /// The first call runs discovery; later calls return the memoized result.
    /// A universe that came out empty or partial stays that way.
    pub fn handlers(&self) -> &[HandlerDescriptor] {
        self.universe.get_or_init(|| self.discover())
    }

    /// Whether discovery has already run.
    pub fn is_loaded(&self) -> bool {
        self.universe.get().is_some()
    }

    /// The first handler in discovery order that can serve `model`.
    pub fn first_for(&self, model: &ModelKey) -> Option<&Capability> {
        self.handlers().iter().find_map(|descriptor| descriptor.capability_for(model))
    }

    fn discover(&self) -> Vec<HandlerDescriptor> {
        debug!("Discovering handler universe");

        let mut universe = Vec::new();
        for unit in self.source.discover() {
            if let Some(err) = &unit.error {
                warn!(
                    unit = %unit.name,
                    kept = unit.handlers.len(),
                    "Handler discovery unit failed, keeping the handlers it registered: {err:#}"
                );
            }
            debug!(unit = %unit.name, handlers = unit.handlers.len(), "Discovered handler unit");
            universe.extend(unit.handlers);
        }

        info!(handlers = universe.len(), "Handler universe loaded");
        universe
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("loaded", &self.is_loaded())
            .field("handlers", &self.universe.get().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::source::DiscoveryUnit;
    use crate::handlers::view::{Handler, ViewContext};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct Story;

    #[derive(Default)]
    struct StoryHandler;

    impl Handler<Story> for StoryHandler {
        fn model(&self, _view: &dyn ViewContext) -> Option<Story> {
            Some(Story)
        }
    }

    /// Counts discovery calls; the second unit always fails.
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl HandlerSource for CountingSource {
        fn discover(&self) -> Vec<DiscoveryUnit> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(10));
            vec![
                DiscoveryUnit {
                    name: "good".to_string(),
                    handlers: vec![
                        HandlerDescriptor::of_default::<StoryHandler>().handles::<Story>().build(),
                    ],
                    error: None,
                },
                DiscoveryUnit {
                    name: "bad".to_string(),
                    handlers: Vec::new(),
                    error: Some(anyhow::anyhow!("could not load")),
                },
            ]
        }
    }

    #[test]
    fn test_discovery_runs_once_under_concurrency() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new(CountingSource {
            calls: Arc::clone(&calls),
        });
        assert!(!registry.is_loaded());

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| assert_eq!(registry.handlers().len(), 1));
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_loaded());
    }

    #[test]
    fn test_failed_unit_does_not_abort_discovery() {
        let registry = HandlerRegistry::new(CountingSource {
            calls: Arc::new(AtomicUsize::new(0)),
        });
        assert!(registry.first_for(&ModelKey::of::<Story>()).is_some());
        assert!(registry.first_for(&ModelKey::of::<String>()).is_none());
    }

    #[test]
    fn test_empty_universe_is_not_an_error() {
        let registry = HandlerRegistry::new(Vec::<HandlerDescriptor>::new());
        assert!(registry.handlers().is_empty());
        assert!(registry.is_loaded());
    }
}
