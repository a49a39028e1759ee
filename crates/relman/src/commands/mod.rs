//! CLI command implementations

pub mod build;
pub mod config;
pub mod verify;

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use relman_core::{HierarchicalConfigLoader, RelmanConfig};

/// Resolve configuration from defaults, the project file, and the environment
pub(crate) fn load_config(config_path: Option<&Utf8Path>) -> Result<RelmanConfig> {
    let loader = match config_path {
        Some(path) => HierarchicalConfigLoader::with_file(path),
        None => HierarchicalConfigLoader::new(),
    };
    loader
        .load()
        .map_err(|e| anyhow!("Failed to load configuration: {}", e))
}
