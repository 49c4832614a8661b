//! `viewbind render`: render one template with a JSON model.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::ViewbindConfig;
use crate::core::ViewbindError;
use crate::templating::TemplateCache;

/// Arguments for `viewbind render`.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Template to render
    ///
    /// `~/x` and bare relative paths resolve against the configured template
    /// root; absolute paths are used as-is. The configured extension is
    /// appended when missing.
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// JSON file bound as `model`
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Extra string variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl RenderCommand {
    /// Render the template.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be read, or the template cannot be
    /// compiled or rendered.
    pub async fn execute(self, config: &ViewbindConfig) -> Result<()> {
        let cache = TemplateCache::from_config(&config.templates)?;

        let model: serde_json::Value = match &self.data {
            Some(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read model from {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON model from {}", path.display()))?
            }
            None => serde_json::Value::Object(serde_json::Map::new()),
        };

        let template = self.template;
        let vars = self.vars;
        let rendered = tokio::task::spawn_blocking(move || -> Result<String, ViewbindError> {
            let compiled = cache.get_compiled(&template)?;
            let mut instance = compiled.instance();
            instance.set_model(&model)?;
            for (key, value) in &vars {
                instance.insert(key.as_str(), value)?;
            }
            instance.render()
        })
        .await
        .context("Render task panicked")??;

        match self.output {
            Some(path) => tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("Failed to write output to {}", path.display())),
            None => {
                print!("{rendered}");
                Ok(())
            }
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
