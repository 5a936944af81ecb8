use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::target::TargetConfig;

/// Root configuration structure for recette.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecetteConfig {
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,

    #[serde(default)]
    pub extension: ExtensionConfig,

    /// Look up target passwords in the system keychain before prompting.
    #[serde(default)]
    pub use_keychain: bool,
}

impl Default for RecetteConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            extension: ExtensionConfig::default(),
            use_keychain: false,
        }
    }
}

/// Extension under test and the harness conventions around it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_extension_name")]
    pub name: String,

    /// Extensions the extension under test depends on.
    #[serde(default)]
    pub requirements: Vec<String>,

    /// Extensions the harness functions depend on.
    #[serde(default = "default_test_requirements")]
    pub test_requirements: Vec<String>,

    #[serde(default = "default_recipe_schema")]
    pub recipe_schema: String,

    #[serde(default = "default_artifact_patterns")]
    pub artifact_patterns: Vec<String>,

    /// Deployment directory used when a target sets none. `{{version}}` is replaced
    /// with the target's version tag.
    #[serde(default = "default_extension_dir_template")]
    pub extension_dir_template: Option<String>,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            name: default_extension_name(),
            requirements: Vec::new(),
            test_requirements: default_test_requirements(),
            recipe_schema: default_recipe_schema(),
            artifact_patterns: default_artifact_patterns(),
            extension_dir_template: default_extension_dir_template(),
        }
    }
}

/// Fill `{{version}}` in an extension directory template.
pub fn extension_dir_from_template(template: &str, version: &str) -> String {
    template.replace("{{version}}", version)
}

// =============================================================================
// Default value functions
// =============================================================================

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DBNAME: &str = "asgard_rec";
pub const DEFAULT_USER: &str = "postgres";

fn default_targets() -> Vec<TargetConfig> {
    [
        ("9.5", 5431),
        ("10", 5432),
        ("11", 5433),
        ("12", 5434),
        ("13", 5435),
        ("14", 5436),
        ("15", 5437),
    ]
    .into_iter()
    .map(|(version, port)| TargetConfig {
        port,
        ..TargetConfig::new(version)
    })
    .collect()
}

fn default_extension_name() -> String {
    "asgard".to_string()
}

fn default_test_requirements() -> Vec<String> {
    vec!["postgres_fdw".to_string()]
}

fn default_recipe_schema() -> String {
    "z_asgard_recette".to_string()
}

fn default_artifact_patterns() -> Vec<String> {
    vec!["*.sql".to_string(), "*.control".to_string()]
}

#[cfg(windows)]
fn default_extension_dir_template() -> Option<String> {
    Some(r"C:\Program Files\PostgreSQL\{{version}}\share\extension".to_string())
}

#[cfg(not(windows))]
fn default_extension_dir_template() -> Option<String> {
    None
}

// =============================================================================
// Loading functions
// =============================================================================

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Builtin,
}

/// Load the configuration.
///
/// An explicit path must exist and parse. Without one, the global recette.json is
/// used when present and built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> crate::Result<(RecetteConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = load_config_from_file(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let global = paths::recette_json()?;
    if global.is_file() {
        let config = load_config_from_file(&global)?;
        return Ok((config, ConfigSource::File(global)));
    }

    Ok((RecetteConfig::default(), ConfigSource::Builtin))
}

fn load_config_from_file(path: &Path) -> crate::Result<RecetteConfig> {
    if !path.exists() {
        return Err(crate::Error::not_found(path.display().to_string(), "file"));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let config: RecetteConfig = serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &RecetteConfig) -> crate::Result<()> {
    if config.extension.name.trim().is_empty() {
        return Err(crate::Error::config_invalid_value(
            "extension.name",
            None,
            "Extension name cannot be empty",
        ));
    }
    if config.extension.recipe_schema.trim().is_empty() {
        return Err(crate::Error::config_invalid_value(
            "extension.recipe_schema",
            None,
            "Recipe schema cannot be empty",
        ));
    }
    if let Some(target) = config.targets.iter().find(|t| t.version.trim().is_empty()) {
        return Err(crate::Error::config_invalid_value(
            "targets.version",
            Some(format!("{}:{}", target.host, target.port)),
            "Every target needs a version tag",
        ));
    }
    Ok(())
}

/// Get built-in configuration (ignoring any file config)
pub fn builtin_config() -> RecetteConfig {
    RecetteConfig::default()
}
