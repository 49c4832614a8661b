//! `viewbind check`: compile templates and report errors.
//!
//! Every template is compiled through one shared [`TemplateCache`], in
//! parallel on the blocking thread pool. Directories are walked recursively
//! and filtered by the configured template extension; files named on the
//! command line are checked as given, whatever their extension.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::ViewbindConfig;
use crate::core::ViewbindError;
use crate::templating::TemplateCache;

/// Arguments for `viewbind check`.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Template files or directories to check
    ///
    /// Paths are relative to the current directory. Defaults to the
    /// configured template root.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

impl CheckCommand {
    /// Compile every selected template.
    ///
    /// # Errors
    ///
    /// Returns an error if no templates can be listed, or if any template
    /// cannot be read or fails to compile.
    pub async fn execute(self, config: &ViewbindConfig, quiet: bool) -> Result<()> {
        let cache = Arc::new(TemplateCache::from_config(&config.templates)?);

        let roots = if self.paths.is_empty() {
            vec![cache.locator().root().to_path_buf()]
        } else {
            self.paths
        };
        let files = collect_templates(&roots, cache.locator().extension())?;

        if files.is_empty() {
            if !quiet {
                println!("No templates found");
            }
            return Ok(());
        }

        tracing::debug!("Checking {} template(s)", files.len());

        let tasks = files.into_iter().map(|file| {
            let cache = Arc::clone(&cache);
            tokio::task::spawn_blocking(move || {
                let result = cache.get_compiled_file(&file).map(|_| ());
                (file, result)
            })
        });

        let mut broken = 0usize;
        let mut unreadable = 0usize;
        let mut total = 0usize;
        for joined in join_all(tasks).await {
            let (file, result) = joined.context("Template check task panicked")?;
            total += 1;
            match result {
                Ok(()) => {
                    if !quiet {
                        println!("{} {}", "✓".green(), file.display());
                    }
                }
                Err(e) => {
                    println!("{} {}", "✗".red(), e);
                    match e {
                        ViewbindError::TemplateIo { .. } => unreadable += 1,
                        _ => broken += 1,
                    }
                }
            }
        }

        let stats = cache.stats();
        tracing::debug!(
            "Compiled {} template(s), {} failure(s)",
            stats.compilations,
            stats.failures
        );

        match failure_summary(broken, unreadable, total) {
            None => {
                if !quiet {
                    println!("{} {} template(s) compiled", "✓".green(), total);
                }
                Ok(())
            }
            Some(summary) => Err(anyhow::anyhow!(summary)),
        }
    }
}

/// One-line summary of a failed check, keeping I/O failures apart from
/// templates that were read but rejected by the compiler.
fn failure_summary(broken: usize, unreadable: usize, total: usize) -> Option<String> {
    match (broken, unreadable) {
        (0, 0) => None,
        (broken, 0) => Some(format!("{broken} of {total} template(s) failed to compile")),
        (0, unreadable) => Some(format!("{unreadable} of {total} template(s) could not be read")),
        (broken, unreadable) => Some(format!(
            "{broken} of {total} template(s) failed to compile, {unreadable} could not be read"
        )),
    }
}

/// Expand directories into the template files beneath them, sorted per root.
fn collect_templates(paths: &[PathBuf], extension: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;

        if !path.is_dir() {
            files.push(path);
            continue;
        }

        for entry in WalkDir::new(&path).follow_links(true).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to list templates under {}", path.display()))?;
            if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}

fn has_extension(path: &Path, extension: Option<&str>) -> bool {
    match extension {
        Some(extension) => path.extension().is_some_and(|ext| ext == extension),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_walks_directories_by_extension() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("news")).unwrap();
        std::fs::write(temp.path().join("b.tera"), "").unwrap();
        std::fs::write(temp.path().join("a.tera"), "").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "").unwrap();
        std::fs::write(temp.path().join("news/list.tera"), "").unwrap();

        let files = collect_templates(&[temp.path().to_path_buf()], Some("tera")).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("a.tera"),
                PathBuf::from("b.tera"),
                PathBuf::from("news/list.tera")
            ]
        );
    }

    #[test]
    fn test_collect_keeps_explicit_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("page.html");
        std::fs::write(&file, "").unwrap();

        let files = collect_templates(&[file.clone()], Some("tera")).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_failure_summary_separates_io() {
        assert_eq!(failure_summary(0, 0, 3), None);
        assert_eq!(
            failure_summary(1, 0, 3).as_deref(),
            Some("1 of 3 template(s) failed to compile")
        );
        assert_eq!(
            failure_summary(0, 2, 3).as_deref(),
            Some("2 of 3 template(s) could not be read")
        );
        assert_eq!(
            failure_summary(1, 1, 3).as_deref(),
            Some("1 of 3 template(s) failed to compile, 1 could not be read")
        );
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a.tera"), Some("tera")));
        assert!(!has_extension(Path::new("a.html"), Some("tera")));
        assert!(has_extension(Path::new("a.html"), None));
    }
}
