//! Template fixtures and temporary template roots.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// A named template source.
#[derive(Clone, Debug)]
pub struct TemplateFixture {
    /// File name relative to the template root, extension included
    pub name: String,
    /// Template source
    pub content: String,
}

impl TemplateFixture {
    /// A fixture with arbitrary content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Renders `model.name`.
    pub fn greeting() -> Self {
        Self::new("greeting.tera", "Hello, {{ model.name }}!")
    }

    /// A list over `model.items`.
    pub fn news_list() -> Self {
        Self::new(
            "news/list.tera",
            r#"<ul>
{% for item in model.items %}  <li>{{ item }}</li>
{% endfor %}</ul>"#,
        )
    }

    /// Unclosed expression on line 2.
    pub fn syntax_error() -> Self {
        Self::new("broken.tera", "<h1>Title</h1>\n{{ model.name ")
    }

    /// Extends a template that is never loaded.
    pub fn missing_parent() -> Self {
        Self::new("orphan.tera", r#"{% extends "layout.tera" %}{% block body %}x{% endblock %}"#)
    }
}

/// A temporary template root, removed on drop.
#[derive(Debug)]
pub struct TemplateDir {
    temp: TempDir,
}

impl TemplateDir {
    /// Create an empty template root.
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: TempDir::new().context("Failed to create temporary template directory")?,
        })
    }

    /// The root directory.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `content` to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a fixture.
    pub fn write_fixture(&self, fixture: &TemplateFixture) -> Result<PathBuf> {
        self.write(&fixture.name, &fixture.content)
    }

    /// Set the modification time of `name` to a fixed point `offset_secs` after
    /// an arbitrary epoch, so tests do not depend on filesystem timestamp
    /// granularity.
    pub fn set_modified(&self, name: &str, offset_secs: u64) -> Result<()> {
        let path = self.temp.path().join(name);
        let file = File::options()
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + offset_secs))
            .with_context(|| format!("Failed to set modification time of {}", path.display()))
    }

    /// Rewrite `name` with new content and move its modification time forward.
    pub fn rewrite(&self, name: &str, content: &str, offset_secs: u64) -> Result<PathBuf> {
        let path = self.write(name, content)?;
        self.set_modified(name, offset_secs)?;
        Ok(path)
    }
}
