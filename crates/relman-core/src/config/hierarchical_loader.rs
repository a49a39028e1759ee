//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Project config (`--config <path>`, else ./relman.yaml when present)
//! 3. Environment variables (RELMAN_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RelmanConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use tracing::debug;

/// Project config file picked up from the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = "relman.yaml";

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/embedded/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Project config file
    project_file: Utf8PathBuf,

    /// Whether the project file was named explicitly (and so must exist)
    explicit: bool,
}

impl HierarchicalConfigLoader {
    /// Loader that reads ./relman.yaml if it exists
    pub fn new() -> Self {
        Self {
            project_file: Utf8PathBuf::from(PROJECT_CONFIG_FILENAME),
            explicit: false,
        }
    }

    /// Loader with a project config file that must exist
    pub fn with_file(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_file: path.into(),
            explicit: true,
        }
    }

    /// Load the configuration with hierarchical precedence
    pub fn load(&self) -> Result<RelmanConfig> {
        let mut merged = Self::load_embedded_defaults()?;

        if self.project_file.exists() {
            debug!("Loading project config from {}", self.project_file);
            let overlay = Self::load_yaml_file(&self.project_file)?;
            Self::merge_values(&mut merged, overlay);
        } else if self.explicit {
            return Err(Error::not_found(self.project_file.as_str()));
        }

        let config: RelmanConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("{}: {}", self.project_file, e)))?;

        Self::apply_env_overrides(config)
    }

    fn load_embedded_defaults() -> Result<Value> {
        let embedded_file = EmbeddedConfigs::get("release-defaults.yaml")
            .ok_or_else(|| Error::invalid_config("Embedded config not found: release-defaults.yaml"))?;

        let content = std::str::from_utf8(&embedded_file.data)
            .map_err(|_| Error::invalid_config("Invalid UTF-8 in embedded config"))?;

        Ok(serde_yaml_ng::from_str(content)?)
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;

        // An empty file parses as null; treat it as "no overrides"
        if value.is_null() {
            return Ok(Value::Mapping(Default::default()));
        }
        Ok(value)
    }

    /// Deep-merge `overlay` into `base`; mappings merge key by key, anything else replaces.
    fn merge_values(base: &mut Value, overlay: Value) {
        match (base, overlay) {
            (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(existing) => Self::merge_values(existing, value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
            (slot, value) => *slot = value,
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: RelmanConfig) -> Result<RelmanConfig> {
        if let Ok(val) = env::var("RELMAN_OUTPUT_DIR") {
            config.output_dir = val;
        }

        if let Ok(val) = env::var("RELMAN_MIN_OS") {
            config.min_os = val;
        }

        if let Ok(val) = env::var("RELMAN_APP_IDENTIFIER") {
            config.app_identifier = val;
        }

        if let Ok(val) = env::var("RELMAN_HEALTH_ENDPOINT") {
            config.health.endpoint = val;
        }

        if let Ok(val) = env::var("RELMAN_HEALTH_TIMEOUT_SECS") {
            config.health.timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("RELMAN_HEALTH_TIMEOUT_SECS must be a valid number")
            })?;
        }

        Ok(config)
    }
}

impl Default for HierarchicalConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
