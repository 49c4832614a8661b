//! Turning template source text into a compiled artifact.
//!
//! [`TemplateCache`](super::TemplateCache) never parses anything itself; it
//! hands source text to a [`TemplateCompiler`] and stores whatever comes back.
//! [`TeraCompiler`] is the production compiler. Tests substitute their own.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::artifact::CompiledTemplate;
use crate::core::ViewbindError;

/// Compiles template source into an artifact the cache can share.
pub trait TemplateCompiler: Send + Sync {
    /// What a successful compilation produces. Shared between threads behind
    /// an [`Arc`](std::sync::Arc), so it must not be mutated after creation.
    type Artifact: Send + Sync + 'static;

    /// Compile `source`, read from the canonical `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileFailure`] describing why the source was rejected.
    fn compile(&self, source: &str, path: &Path) -> Result<Self::Artifact, CompileFailure>;
}

/// Which stage rejected the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The source is not syntactically valid
    Parse,
    /// The source parsed but cannot be assembled (missing parent, circular extends)
    Compile,
}

/// A compiler diagnostic, not yet tied to a template path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    /// Stage that failed
    pub kind: FailureKind,
    /// Human-readable diagnostic
    pub message: String,
    /// 1-based line, when the compiler reported one
    pub line: Option<usize>,
    /// 1-based column, when the compiler reported one
    pub column: Option<usize>,
}

impl CompileFailure {
    /// A syntax error at an optional location.
    pub fn parse(message: impl Into<String>, line: Option<usize>, column: Option<usize>) -> Self {
        Self {
            kind: FailureKind::Parse,
            message: message.into(),
            line,
            column,
        }
    }

    /// A failure after parsing succeeded.
    pub fn compile(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Compile,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Attach the template path, producing the matching [`ViewbindError`].
    pub fn into_error(self, path: PathBuf) -> ViewbindError {
        match self.kind {
            FailureKind::Parse => ViewbindError::TemplateParse {
                path,
                message: self.message,
                line: self.line,
                column: self.column,
            },
            FailureKind::Compile => ViewbindError::TemplateCompile {
                path,
                message: self.message,
            },
        }
    }
}

/// Compiles templates with [Tera](https://keats.github.io/tera/).
///
/// Each template gets its own `Tera` instance registered under its canonical
/// path, so `{% extends %}` and `{% include %}` of other files are compile
/// errors rather than silent cross-template lookups.
#[derive(Debug, Clone, Copy)]
pub struct TeraCompiler {
    autoescape: bool,
}

impl Default for TeraCompiler {
    fn default() -> Self {
        Self { autoescape: true }
    }
}

impl TeraCompiler {
    /// A compiler with HTML autoescaping on or off.
    pub fn new(autoescape: bool) -> Self {
        Self { autoescape }
    }

    /// Whether variable output is HTML-escaped.
    pub fn autoescape(&self) -> bool {
        self.autoescape
    }
}

impl TemplateCompiler for TeraCompiler {
    type Artifact = CompiledTemplate;

    fn compile(&self, source: &str, path: &Path) -> Result<CompiledTemplate, CompileFailure> {
        let name = path.to_string_lossy().into_owned();

        let mut tera = tera::Tera::default();
        // An empty suffix matches every template name.
        tera.autoescape_on(if self.autoescape { vec![""] } else { vec![] });

        tera.add_raw_template(&name, source)
            .map_err(|e| classify_tera_error(&e, &name))?;

        Ok(CompiledTemplate::new(tera, name, path.to_path_buf()))
    }
}

fn classify_tera_error(error: &tera::Error, name: &str) -> CompileFailure {
    let message = describe_tera_error(error, name);

    if matches!(
        error.kind,
        tera::ErrorKind::MissingParent { .. } | tera::ErrorKind::CircularExtend { .. }
    ) {
        return CompileFailure::compile(message);
    }

    match extract_location(error) {
        Some((line, column)) => CompileFailure::parse(message, Some(line), Some(column)),
        None => CompileFailure::compile(message),
    }
}

/// Pest reports positions as ` --> line:col`.
fn extract_location(error: &tera::Error) -> Option<(usize, usize)> {
    static LOCATION: OnceLock<Option<Regex>> = OnceLock::new();
    let re = LOCATION
        .get_or_init(|| Regex::new(r"-->\s*(\d+):(\d+)").ok())
        .as_ref()?;

    let error_msg = format!("{error:?}");
    let caps = re.captures(&error_msg)?;
    let line = caps.get(1)?.as_str().parse().ok()?;
    let column = caps.get(2)?.as_str().parse().ok()?;
    Some((line, column))
}

/// Flatten a Tera error chain into one message without Tera's wrapper lines.
pub(crate) fn describe_tera_error(error: &tera::Error, name: &str) -> String {
    use std::error::Error;

    // Tera quotes names with either `'name'` or `"name"` depending on the message.
    let quotings = [format!("'{name}'"), format!("{name:?}")];
    let mut messages = Vec::new();
    let mut current: Option<&dyn Error> = Some(error);

    while let Some(err) = current {
        let mut cleaned = err.to_string();
        for quoted in &quotings {
            cleaned = cleaned
                .replace(&format!("Failed to parse {quoted}"), "")
                .replace(&format!("Failed to render {quoted}"), "")
                .replace(&format!("while rendering {quoted}"), "")
                .replace(quoted.as_str(), "template");
        }
        let cleaned = cleaned.trim().to_string();

        if !cleaned.is_empty() {
            messages.push(cleaned);
        }
        current = err.source();
    }

    if messages.is_empty() {
        "Template error (no diagnostic available)".to_string()
    } else {
        messages.join("\n  → ")
    }
}
