use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level artq config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ArtqConfig {
    pub db_path: Option<PathBuf>,
    pub default_limit: Option<usize>,
}

impl ArtqConfig {
    /// Load config from ~/.artq/config.toml. Returns default if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(ArtqConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: ArtqConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;
        Ok(config)
    }

    /// Render for `artq config show`.
    pub fn display(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref path) = self.db_path {
            lines.push(format!("db_path = \"{}\"", path.display()));
        }
        if let Some(limit) = self.default_limit {
            lines.push(format!("default_limit = {limit}"));
        }
        if lines.is_empty() {
            lines.push("(empty config)".to_string());
        }
        lines.join("\n")
    }
}

/// Path to the config file: ~/.artq/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".artq").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.artq/config.toml
# Database path resolution order: --db flag > ARTQ_DB env > db_path here > ~/.artq/artq.db

# db_path = "/path/to/artq.db"
# default_limit = 50
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config() -> Result<bool> {
    let path = config_path()?;
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_config_template())?;
    Ok(true)
}
