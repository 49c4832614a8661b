//! Command-line interface for viewbind.
//!
//! # Commands
//!
//! - `check` - compile templates and report parse/compile errors
//! - `render` - render one template with a JSON model
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: no logging, only results and errors
//! - `--config` / `-c`: explicit config file (otherwise `$VIEWBIND_CONFIG` or
//!   `~/.viewbind/config.toml`)
//!
//! # Examples
//!
//! ```bash
//! # Compile everything under the configured template root
//! viewbind check
//!
//! # Compile a subtree
//! viewbind check views/news
//!
//! # Render with a model
//! viewbind render ~/news/list --data list.json --var edition=morning
//! ```

mod check;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ViewbindConfig;

/// Main CLI structure.
#[derive(Parser)]
#[command(
    name = "viewbind",
    about = "Check and render server-side view templates",
    version,
    long_about = "viewbind compiles and caches server-side view templates and binds them to view-models. \
                  The CLI checks templates for errors and renders them with JSON models."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the config file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile templates and report errors
    Check(check::CheckCommand),

    /// Render a template with a JSON model
    Render(render::RenderCommand),
}

impl Cli {
    /// Log filter directive implied by the flags: `None` means logging is off.
    #[must_use]
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            None
        } else {
            Some("info")
        }
    }

    /// Load configuration and run the selected command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command fails.
    pub async fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => ViewbindConfig::load_from(path).await?,
            None => ViewbindConfig::load().await?,
        };
        self.execute_with_config(&config).await
    }

    /// Run the selected command with already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn execute_with_config(self, config: &ViewbindConfig) -> Result<()> {
        match self.command {
            Commands::Check(cmd) => cmd.execute(config, self.quiet).await,
            Commands::Render(cmd) => cmd.execute(config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_flags() {
        let cli = Cli::parse_from(["viewbind", "check"]);
        assert_eq!(cli.log_level(), Some("info"));

        let cli = Cli::parse_from(["viewbind", "-v", "check"]);
        assert_eq!(cli.log_level(), Some("debug"));

        let cli = Cli::parse_from(["viewbind", "check", "--quiet"]);
        assert_eq!(cli.log_level(), None);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["viewbind", "-v", "-q", "check"]).is_err());
    }

    #[test]
    fn test_render_arguments() {
        let cli = Cli::parse_from([
            "viewbind",
            "--config",
            "/tmp/viewbind.toml",
            "render",
            "~/news/list",
            "--var",
            "edition=morning",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/viewbind.toml")));
        assert!(matches!(cli.command, Commands::Render(_)));
    }
}
