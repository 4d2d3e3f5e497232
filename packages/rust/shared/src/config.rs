//! Application configuration for Docflow.
//!
//! User config lives at `~/.docflow/docflow.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocflowError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docflow.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docflow";

// ---------------------------------------------------------------------------
// Config structs (matching docflow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Text-generation backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Tracked documentation files.
    #[serde(default)]
    pub docs: DocsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default update kind when the CLI does not specify one.
    #[serde(default = "default_kind")]
    pub kind: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
        }
    }
}

fn default_kind() -> String {
    "full".into()
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend provider: "deepseek", "openai", or "gemini".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override; each provider has its own default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            default_model: None,
        }
    }
}

fn default_provider() -> String {
    "deepseek".into()
}

/// `[docs]` section: paths of the tracked documentation files,
/// relative to the repository root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Development worklog (receives generated entries).
    #[serde(default = "default_devlog")]
    pub devlog: String,

    /// Architecture notes and guardrails.
    #[serde(default = "default_architecture")]
    pub architecture: String,

    /// Project layout conventions.
    #[serde(default = "default_structure")]
    pub structure: String,

    /// Task board.
    #[serde(default = "default_tasks")]
    pub tasks: String,

    /// Requirements list.
    #[serde(default = "default_requirements")]
    pub requirements: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            devlog: default_devlog(),
            architecture: default_architecture(),
            structure: default_structure(),
            tasks: default_tasks(),
            requirements: default_requirements(),
        }
    }
}

fn default_devlog() -> String {
    "docs/dev-log.md".into()
}
fn default_architecture() -> String {
    "docs/architecture.md".into()
}
fn default_structure() -> String {
    "docs/project-structure.md".into()
}
fn default_tasks() -> String {
    "docs/tasks.md".into()
}
fn default_requirements() -> String {
    "docs/requirements.md".into()
}

impl DocsConfig {
    /// All tracked document paths, in pipeline order.
    pub fn all_paths(&self) -> Vec<String> {
        vec![
            self.devlog.clone(),
            self.architecture.clone(),
            self.structure.clone(),
            self.tasks.clone(),
            self.requirements.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docflow/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocflowError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docflow/docflow.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocflowError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocflowError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocflowError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocflowError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocflowError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("devlog"));
        assert!(toml_str.contains("deepseek"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.kind, "full");
        assert_eq!(parsed.llm.provider, "deepseek");
        assert_eq!(parsed.docs.devlog, "docs/dev-log.md");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[llm]
provider = "gemini"
default_model = "gemini-1.5-flash"

[docs]
devlog = "notes/log.md"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.default_model.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(config.docs.devlog, "notes/log.md");
        // Untouched sections fall back to defaults.
        assert_eq!(config.docs.tasks, "docs/tasks.md");
        assert_eq!(config.defaults.kind, "full");
    }

    #[test]
    fn all_paths_in_pipeline_order() {
        let docs = DocsConfig::default();
        let paths = docs.all_paths();
        assert_eq!(paths.len(), 5);
        assert_eq!(paths[0], "docs/dev-log.md");
        assert_eq!(paths[4], "docs/requirements.md");
    }
}
