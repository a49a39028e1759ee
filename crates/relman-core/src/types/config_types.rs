//! Configuration types for manifest builds
//!
//! Values here supply the defaults of the `build` surface. Release identity
//! (tag, commit, runtime versions) is never configured, only passed per run.

use serde::{Deserialize, Serialize};

use super::manifest::MANIFEST_FILENAME;

/// Resolved relman configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelmanConfig {
    /// Directory that receives copied artifacts and the manifest
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Manifest file name inside the output directory
    #[serde(default = "default_manifest_filename")]
    pub manifest_filename: String,

    /// Compact `platform=version[,...]` minimum OS mapping
    #[serde(default = "default_min_os")]
    pub min_os: String,

    /// Application identifier used in ready-state file paths
    #[serde(default = "default_app_identifier")]
    pub app_identifier: String,

    /// Health contract settings
    #[serde(default)]
    pub health: HealthConfig,
}

/// Health contract settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HealthConfig {
    #[serde(default = "default_health_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_health_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_bootstrap_argument")]
    pub bootstrap_argument: String,
}

impl Default for RelmanConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            manifest_filename: default_manifest_filename(),
            min_os: default_min_os(),
            app_identifier: default_app_identifier(),
            health: HealthConfig::default(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            endpoint: default_health_endpoint(),
            timeout_secs: default_health_timeout(),
            bootstrap_argument: default_bootstrap_argument(),
        }
    }
}

impl RelmanConfig {
    /// Detached signature file name for the configured manifest.
    pub fn signature_filename(&self) -> String {
        format!("{}.sig", self.manifest_filename)
    }
}

fn default_output_dir() -> String {
    "release-artifacts".to_string()
}

fn default_manifest_filename() -> String {
    MANIFEST_FILENAME.to_string()
}

fn default_min_os() -> String {
    "windows=10.0.19045,macos=13.0,linux=Ubuntu 22.04".to_string()
}

fn default_app_identifier() -> String {
    "com.aethercore.tactical-glass-dev".to_string()
}

fn default_health_endpoint() -> String {
    "http://127.0.0.1:8080/healthz".to_string()
}

fn default_health_timeout() -> u64 {
    30
}

fn default_bootstrap_argument() -> String {
    "--bootstrap".to_string()
}
