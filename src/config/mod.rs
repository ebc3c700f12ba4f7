// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = ".dub.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    /// Picks the format from the file extension; anything unknown is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            Some("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

/// Parse and validate configuration text.
pub fn parse_config(contents: &str, format: Format) -> Result<Config> {
    let config: Config = match format {
        Format::Toml => toml::from_str(contents).context("Failed to parse TOML config")?,
        Format::Yaml => serde_yaml::from_str(contents).context("Failed to parse YAML config")?,
        Format::Json => serde_json::from_str(contents).context("Failed to parse JSON config")?,
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file (TOML, YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    parse_config(&contents, Format::from_path(path))
}
