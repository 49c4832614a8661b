//! The viewbind configuration file.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.viewbind/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\viewbind\config.toml`
//! - **Override**: set `VIEWBIND_CONFIG` to an explicit path
//!
//! A missing file is not an error; every setting has a default.
//!
//! # File Format
//!
//! ```toml
//! [templates]
//! # Template root; `~` is expanded. Relative template paths resolve here.
//! root = "~/site/views"
//! # Appended to requested paths that lack it
//! extension = "tera"
//! # HTML-escape variable output
//! autoescape = true
//!
//! [handlers]
//! # Identity used in resolution error messages
//! resolver_name = "site"
//! # Handler modules to discover, in discovery order; empty means all
//! modules = ["news", "navigation"]
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use viewbind::config::ViewbindConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ViewbindConfig::load().await?;
//! println!("Templates under {}", config.templates.root_dir()?.display());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::ViewbindError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "VIEWBIND_CONFIG";

fn default_extension() -> Option<String> {
    Some("tera".to_string())
}

const fn default_autoescape() -> bool {
    true
}

/// Template cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory that root-relative (`~/...`) and bare relative template paths
    /// resolve against. Defaults to the current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// File extension appended to requested template paths that lack it.
    #[serde(default = "default_extension")]
    pub extension: Option<String>,

    /// Whether variable output is HTML-escaped.
    #[serde(default = "default_autoescape")]
    pub autoescape: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: None,
            extension: default_extension(),
            autoescape: default_autoescape(),
        }
    }
}

impl TemplatesConfig {
    /// The template root with `~` and environment variables expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ViewbindError::ConfigError`] if expansion refers to an unset
    /// variable, or if no root is configured and the current directory is
    /// unavailable.
    pub fn root_dir(&self) -> Result<PathBuf, ViewbindError> {
        match &self.root {
            Some(root) => shellexpand::full(root)
                .map(|expanded| PathBuf::from(expanded.as_ref()))
                .map_err(|e| ViewbindError::ConfigError {
                    message: format!("cannot expand templates.root '{root}': {e}"),
                }),
            None => std::env::current_dir().map_err(|e| ViewbindError::ConfigError {
                message: format!("no templates.root configured and current directory is unavailable: {e}"),
            }),
        }
    }
}

/// Handler resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlersConfig {
    /// Identity of the configured resolver in error messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_name: Option<String>,

    /// Handler modules to discover, in discovery order. Empty means every module.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewbindConfig {
    /// Template cache settings
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Handler resolution settings
    #[serde(default)]
    pub handlers: HandlersConfig,
}

impl ViewbindConfig {
    /// Load from `$VIEWBIND_CONFIG` or the default location, falling back to
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };
        Self::load_with_optional(Some(path)).await
    }

    /// Load from `path` if given and present, else from the default location,
    /// else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save to a specific file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Platform default config path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or, on Windows, local data) directory
    /// cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("viewbind")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".viewbind")
        };

        Ok(config_dir.join("config.toml"))
    }
}
