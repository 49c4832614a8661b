//! Turning a requested template path into the canonical file path the cache keys on.
//!
//! Rules, applied in order:
//!
//! 1. If a default extension is configured and the request does not already
//!    end in it, the extension is appended (`news/list` → `news/list.tera`,
//!    `page.html` → `page.html.tera`).
//! 2. `~/x` resolves against the template root.
//! 3. An absolute path is used as-is.
//! 4. Any other relative path resolves against the directory of the requesting
//!    template when there is one, otherwise against the root.
//! 5. The result is canonicalized, so every spelling of one file shares one
//!    cache entry. A file that does not exist fails here.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::config::TemplatesConfig;
use crate::core::ViewbindError;

/// Maps requested template paths onto canonical files under a template root.
#[derive(Debug, Clone)]
pub struct TemplateLocator {
    root: PathBuf,
    extension: Option<String>,
}

impl TemplateLocator {
    /// A locator rooted at `root` with no default extension.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: None,
        }
    }

    /// Append `extension` (without the leading dot) to requests lacking it.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.');
        self.extension = (!extension.is_empty()).then(|| extension.to_string());
        self
    }

    /// A locator for the configured template root and extension.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::ConfigError`] if the root cannot be expanded.
    pub fn from_config(config: &TemplatesConfig) -> Result<Self, ViewbindError> {
        let locator = Self::new(config.root_dir()?);
        Ok(match &config.extension {
            Some(extension) => locator.with_extension(extension.as_str()),
            None => locator,
        })
    }

    /// The template root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The extension appended to requests lacking it.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Canonical path for a request relative to the root.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::TemplateIo`] if the file does not exist or
    /// cannot be canonicalized.
    pub fn resolve(&self, requested: impl AsRef<Path>) -> Result<PathBuf, ViewbindError> {
        canonicalize(self.locate(requested.as_ref(), None))
    }

    /// Canonical path for a request made from inside the template `base_file`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::TemplateIo`] if the file does not exist or
    /// cannot be canonicalized.
    pub fn resolve_relative(
        &self,
        requested: impl AsRef<Path>,
        base_file: impl AsRef<Path>,
    ) -> Result<PathBuf, ViewbindError> {
        canonicalize(self.locate(requested.as_ref(), Some(base_file.as_ref())))
    }

    /// Canonical path for a file named exactly, skipping extension translation.
    ///
    /// Relative paths are taken from the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::TemplateIo`] if the file does not exist or
    /// cannot be canonicalized.
    pub fn resolve_exact(&self, file: impl AsRef<Path>) -> Result<PathBuf, ViewbindError> {
        canonicalize(file.as_ref().to_path_buf())
    }

    /// The path a request maps to before canonicalization.
    pub fn locate(&self, requested: &Path, base_file: Option<&Path>) -> PathBuf {
        let requested = self.translate(requested);

        if let Ok(below_root) = requested.strip_prefix("~") {
            return self.root.join(below_root);
        }
        if requested.is_absolute() {
            return requested;
        }

        match base_file.and_then(Path::parent) {
            Some(dir) => dir.join(requested),
            None => self.root.join(requested),
        }
    }

    /// Append the default extension when `requested` does not already end in it.
    pub fn translate(&self, requested: &Path) -> PathBuf {
        let Some(extension) = &self.extension else {
            return requested.to_path_buf();
        };
        let names_file = matches!(requested.components().next_back(), Some(Component::Normal(_)));
        if !names_file || requested.extension().is_some_and(|ext| ext == extension.as_str()) {
            return requested.to_path_buf();
        }

        let mut translated = OsString::from(requested.as_os_str());
        translated.push(".");
        translated.push(extension);
        PathBuf::from(translated)
    }
}

fn canonicalize(path: PathBuf) -> Result<PathBuf, ViewbindError> {
    std::fs::canonicalize(&path).map_err(|source| ViewbindError::TemplateIo { path, source })
}
