//! Compiled template cache with modification-time invalidation.
//!
//! Entries are keyed by canonical path. An entry is fresh while the file's
//! modification time equals the one recorded when it was compiled; anything
//! else triggers recompilation.
//!
//! # Concurrency
//!
//! Fresh entries are served without taking any lock. Misses and stale entries
//! take the path's [`KeyedLock`] ticket, check the map again (another caller
//! may have just compiled it), and only then read and compile the file. For a
//! given path and a given version of the file the compiler therefore runs at
//! most once, no matter how many callers race. Different paths never wait for
//! each other.
//!
//! Entries are immutable and replaced whole, so readers see either the
//! previous artifact or the new one. A compile failure leaves the previous
//! entry in place; the next request for the same file version retries.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use super::compiler::{TemplateCompiler, TeraCompiler};
use super::locator::TemplateLocator;
use crate::cache::KeyedLock;
use crate::config::TemplatesConfig;
use crate::core::ViewbindError;

struct CacheEntry<A> {
    artifact: Arc<A>,
    modified: SystemTime,
}

/// Cache counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from a fresh entry without locking
    pub hits: u64,
    /// Requests that had to take the path lock
    pub misses: u64,
    /// Compiler invocations
    pub compilations: u64,
    /// Compiler invocations that failed
    pub failures: u64,
}

impl CacheStats {
    /// Share of requests served lock-free, as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Maps template files to compiled artifacts.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use viewbind::templating::{TemplateCache, TemplateLocator, TeraCompiler};
///
/// let cache = TemplateCache::new(
///     TeraCompiler::default(),
///     TemplateLocator::new("/srv/views").with_extension("tera"),
/// );
///
/// let first = cache.get_compiled("~/news/list")?;
/// let again = cache.get_compiled("news/list.tera")?;
/// assert!(Arc::ptr_eq(&first, &again));
/// # Ok::<(), viewbind::core::ViewbindError>(())
/// ```
pub struct TemplateCache<C: TemplateCompiler = TeraCompiler> {
    compiler: C,
    locator: TemplateLocator,
    entries: DashMap<PathBuf, Arc<CacheEntry<C::Artifact>>>,
    locks: KeyedLock,
    hits: AtomicU64,
    misses: AtomicU64,
    compilations: AtomicU64,
    failures: AtomicU64,
}

impl TemplateCache<TeraCompiler> {
    /// A Tera-backed cache for the configured template root.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::ConfigError`] if the template root cannot be expanded.
    pub fn from_config(config: &TemplatesConfig) -> Result<Self, ViewbindError> {
        Ok(Self::new(TeraCompiler::new(config.autoescape), TemplateLocator::from_config(config)?))
    }
}

impl<C: TemplateCompiler> TemplateCache<C> {
    /// An empty cache.
    pub fn new(compiler: C, locator: TemplateLocator) -> Self {
        Self {
            compiler,
            locator,
            entries: DashMap::new(),
            locks: KeyedLock::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            compilations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// The compiler used for misses.
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// The locator used to canonicalize requests.
    pub fn locator(&self) -> &TemplateLocator {
        &self.locator
    }

    /// The compiled artifact for a template path, compiling it if needed.
    ///
    /// # Errors
    ///
    /// - [`ViewbindError::TemplateIo`] if the file is missing or unreadable
    /// - [`ViewbindError::TemplateParse`] / [`ViewbindError::TemplateCompile`]
    ///   if the compiler rejects it
    pub fn get_compiled(&self, path: impl AsRef<Path>) -> Result<Arc<C::Artifact>, ViewbindError> {
        let canonical = self.locator.resolve(path)?;
        self.load(canonical)
    }

    /// Like [`get_compiled`](Self::get_compiled) for a request made from inside
    /// the template `base_file`; bare relative paths resolve next to it.
    ///
    /// # Errors
    ///
    /// Same as [`get_compiled`](Self::get_compiled).
    pub fn get_compiled_relative(
        &self,
        path: impl AsRef<Path>,
        base_file: impl AsRef<Path>,
    ) -> Result<Arc<C::Artifact>, ViewbindError> {
        let canonical = self.locator.resolve_relative(path, base_file)?;
        self.load(canonical)
    }

    /// Like [`get_compiled`](Self::get_compiled) for a file named exactly; the
    /// default extension is not appended.
    ///
    /// # Errors
    ///
    /// Same as [`get_compiled`](Self::get_compiled).
    pub fn get_compiled_file(&self, file: impl AsRef<Path>) -> Result<Arc<C::Artifact>, ViewbindError> {
        let canonical = self.locator.resolve_exact(file)?;
        self.load(canonical)
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a canonical path currently has an entry, fresh or not.
    pub fn contains(&self, canonical: &Path) -> bool {
        self.entries.contains_key(canonical)
    }

    /// Counters since construction.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    fn load(&self, path: PathBuf) -> Result<Arc<C::Artifact>, ViewbindError> {
        let modified = modified_time(&path)?;
        if let Some(artifact) = self.fresh(&path, modified) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(artifact);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let key = path.to_string_lossy();
        let _guard = self.locks.acquire(&key);

        // Stat again before reading: the stored time must never be newer than the content.
        let modified = modified_time(&path)?;
        if let Some(artifact) = self.fresh(&path, modified) {
            debug!("Template {} was compiled by a concurrent caller", path.display());
            return Ok(artifact);
        }
        if self.entries.contains_key(&path) {
            debug!("Template {} changed on disk", path.display());
        }

        let source = std::fs::read_to_string(&path).map_err(|source| ViewbindError::TemplateIo {
            path: path.clone(),
            source,
        })?;

        info!("Compiling template: {}", path.display());
        self.compilations.fetch_add(1, Ordering::Relaxed);
        let artifact = match self.compiler.compile(&source, &path) {
            Ok(artifact) => Arc::new(artifact),
            Err(failure) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!("Template {} failed to compile: {}", path.display(), failure.message);
                return Err(failure.into_error(path));
            }
        };

        self.entries.insert(
            path,
            Arc::new(CacheEntry {
                artifact: Arc::clone(&artifact),
                modified,
            }),
        );
        Ok(artifact)
    }

    fn fresh(&self, path: &Path, modified: SystemTime) -> Option<Arc<C::Artifact>> {
        let entry = self.entries.get(path)?;
        (entry.modified == modified).then(|| Arc::clone(&entry.artifact))
    }
}

impl<C: TemplateCompiler> std::fmt::Debug for TemplateCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("locator", &self.locator)
            .field("entries", &self.entries.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn modified_time(path: &Path) -> Result<SystemTime, ViewbindError> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).map_err(|source| {
        ViewbindError::TemplateIo {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::compiler::CompileFailure;
    use std::fs::File;
    use std::sync::Barrier;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Echoes the source back and counts invocations.
    #[derive(Default)]
    struct CountingCompiler {
        calls: AtomicUsize,
    }

    impl TemplateCompiler for CountingCompiler {
        type Artifact = String;

        fn compile(&self, source: &str, _path: &Path) -> Result<String, CompileFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Widen the race window.
            thread::sleep(Duration::from_millis(20));
            if source.contains("{%") {
                return Err(CompileFailure::parse("unclosed tag", Some(1), Some(1)));
            }
            Ok(source.to_string())
        }
    }

    fn write_template(dir: &Path, name: &str, content: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + age_secs))
            .unwrap();
        path
    }

    fn cache(dir: &Path) -> TemplateCache<CountingCompiler> {
        TemplateCache::new(CountingCompiler::default(), TemplateLocator::new(dir))
    }

    #[test]
    fn test_compiles_once_under_race() {
        let temp = TempDir::new().unwrap();
        write_template(temp.path(), "page.tera", "hello", 0);
        let cache = cache(temp.path());
        let barrier = Barrier::new(16);

        let artifacts: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get_compiled("page.tera").unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.compiler().calls.load(Ordering::SeqCst), 1);
        assert!(artifacts.iter().all(|a| Arc::ptr_eq(a, &artifacts[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_entry_recompiles_once_under_race() {
        let temp = TempDir::new().unwrap();
        write_template(temp.path(), "page.tera", "old", 0);
        let cache = cache(temp.path());
        let old = cache.get_compiled("page.tera").unwrap();

        write_template(temp.path(), "page.tera", "new", 60);
        let barrier = Barrier::new(16);
        let artifacts: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get_compiled("page.tera").unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.compiler().calls.load(Ordering::SeqCst), 2);
        assert!(artifacts.iter().all(|a| Arc::ptr_eq(a, &artifacts[0])));
        assert!(!Arc::ptr_eq(&old, &artifacts[0]));
        assert_eq!(artifacts[0].as_str(), "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_exact_file_skips_extension() {
        let temp = TempDir::new().unwrap();
        let page = write_template(temp.path(), "page.html", "page", 0);
        let cache = TemplateCache::new(
            CountingCompiler::default(),
            TemplateLocator::new(temp.path()).with_extension("tera"),
        );

        assert!(matches!(cache.get_compiled(&page), Err(ViewbindError::TemplateIo { .. })));
        assert_eq!(cache.get_compiled_file(&page).unwrap().as_str(), "page");
        assert!(cache.contains(&page.canonicalize().unwrap()));
    }

    #[test]
    fn test_fresh_entry_is_a_lock_free_hit() {
        let temp = TempDir::new().unwrap();
        write_template(temp.path(), "page.tera", "hello", 0);
        let cache = cache(temp.path());

        let first = cache.get_compiled("page.tera").unwrap();
        let second = cache.get_compiled("./page.tera").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.compilations, 1);
        assert!((stats.hit_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_changed_file_is_recompiled() {
        let temp = TempDir::new().unwrap();
        write_template(temp.path(), "page.tera", "old", 0);
        let cache = cache(temp.path());

        let old = cache.get_compiled("page.tera").unwrap();
        assert_eq!(old.as_str(), "old");

        write_template(temp.path(), "page.tera", "new", 60);
        let new = cache.get_compiled("page.tera").unwrap();

        assert_eq!(new.as_str(), "new");
        assert_eq!(old.as_str(), "old");
        assert_eq!(cache.compiler().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_recompile_keeps_previous_entry() {
        let temp = TempDir::new().unwrap();
        let path = write_template(temp.path(), "page.tera", "good", 0);
        let cache = cache(temp.path());
        cache.get_compiled("page.tera").unwrap();

        write_template(temp.path(), "page.tera", "{% broken", 60);
        let err = cache.get_compiled("page.tera").unwrap_err();
        assert!(matches!(err, ViewbindError::TemplateParse { line: Some(1), .. }));
        assert_eq!(err.template_path(), Some(path.canonicalize().unwrap().as_path()));
        assert!(cache.contains(&path.canonicalize().unwrap()));
        assert_eq!(cache.stats().failures, 1);

        // Still stale, so the next request retries the compiler.
        assert!(cache.get_compiled("page.tera").is_err());
        assert_eq!(cache.compiler().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let cache = cache(temp.path());
        assert!(matches!(
            cache.get_compiled("absent.tera"),
            Err(ViewbindError::TemplateIo { .. })
        ));
        assert_eq!(cache.compiler().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_relative_to_including_template() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("news")).unwrap();
        let list = write_template(&temp.path().join("news"), "list.tera", "list", 0);
        write_template(&temp.path().join("news"), "item.tera", "item", 0);
        write_template(temp.path(), "header.tera", "header", 0);
        let cache = cache(temp.path());

        assert_eq!(cache.get_compiled_relative("item.tera", &list).unwrap().as_str(), "item");
        assert_eq!(cache.get_compiled_relative("~/header.tera", &list).unwrap().as_str(), "header");
    }

    #[test]
    fn test_distinct_paths_compile_independently() {
        let temp = TempDir::new().unwrap();
        for i in 0..4 {
            write_template(temp.path(), &format!("t{i}.tera"), &format!("t{i}"), 0);
        }
        let cache = cache(temp.path());

        thread::scope(|s| {
            for i in 0..4 {
                let cache = &cache;
                s.spawn(move || cache.get_compiled(format!("t{i}.tera")).unwrap());
            }
        });

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.compiler().calls.load(Ordering::SeqCst), 4);
    }
}
