//! Release manifest document.
//!
//! The manifest is written next to the staged installers and, when a signing
//! key is supplied, covered by a detached `rsa-sha256` signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::platform::Platform;

/// Version of the manifest format.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default manifest file name inside the output directory.
pub const MANIFEST_FILENAME: &str = "release-manifest.json";

/// Algorithm recorded in the manifest signature block.
pub const SIGNATURE_ALGORITHM: &str = "rsa-sha256";

/// Minimum OS version recorded when the platform has no mapping.
pub const UNSPECIFIED_OS_VERSION: &str = "unspecified";

/// Complete release manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Manifest format version
    pub schema_version: String,

    /// Build timestamp, captured once per build
    pub generated_at: DateTime<Utc>,

    /// Release identity
    pub release: ReleaseInfo,

    /// Runtime component name -> version
    pub bundled_runtime_versions: BTreeMap<String, String>,

    /// Liveness contract for shipped instances
    pub health_contract: HealthContract,

    /// Artifacts in discovery order
    pub artifacts: Vec<Artifact>,

    /// Detached signature pointer (signed manifests only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureInfo>,

    /// Top-level keys written by newer tooling, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Release identity. Both values are opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag: String,
    pub commit: String,
}

/// How a shipped instance proves it is alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthContract {
    /// Argument that starts the instance in bootstrap mode
    pub bootstrap_argument: String,

    /// Per-platform path of the file written once the instance is ready
    pub ready_state_files: BTreeMap<Platform, String>,

    /// Health-check URL
    pub health_endpoint: String,

    /// Seconds allowed between launch and a healthy response
    pub startup_timeout_seconds: u64,
}

/// One installer file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File base name
    pub name: String,

    /// Location relative to the artifacts root
    #[serde(default)]
    pub path: String,

    pub platform: Platform,

    /// Lowercase file extension without the dot
    #[serde(rename = "type")]
    pub artifact_type: String,

    /// Lowercase hex SHA256 of the file at build time
    pub sha256: String,

    pub size_bytes: u64,

    pub minimum_os_version: String,
}

/// Detached signature metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// Signature scheme (rsa-sha256)
    pub algorithm: String,

    /// Signature file name, relative to the manifest directory
    pub signature_file: String,
}

impl ReleaseManifest {
    /// Serializes the manifest exactly as it is written to disk:
    /// two-space indented JSON followed by a newline.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Deserializes a manifest from JSON.
    pub fn from_json(json: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(json)
    }

    /// Loads a manifest from disk.
    ///
    /// # Errors
    /// [`Error::ManifestNotFound`] if the file does not exist,
    /// [`Error::ManifestMalformed`] if it does not match the schema.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::manifest_not_found(path.display().to_string()));
        }

        let bytes = fs::read(path)?;
        Self::from_json(&bytes)
            .map_err(|e| Error::manifest_malformed(path.display().to_string(), e.to_string()))
    }

    /// Writes the serialized manifest to `path`, returning the bytes written.
    pub fn write(&self, path: &Path) -> Result<Vec<u8>> {
        let bytes = self.to_json_bytes()?;
        fs::write(path, &bytes)?;
        Ok(bytes)
    }

    /// True when the manifest carries a signature pointer.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

impl HealthContract {
    /// Builds the contract with ready-state paths rendered for `app_identifier`.
    pub fn new(
        app_identifier: &str,
        bootstrap_argument: impl Into<String>,
        health_endpoint: impl Into<String>,
        startup_timeout_seconds: u64,
    ) -> Self {
        let ready_state_files = Platform::all()
            .into_iter()
            .map(|platform| (platform, ready_state_file(platform, app_identifier)))
            .collect();

        Self {
            bootstrap_argument: bootstrap_argument.into(),
            ready_state_files,
            health_endpoint: health_endpoint.into(),
            startup_timeout_seconds,
        }
    }
}

/// Path template of the runtime-config file an instance writes when ready.
pub fn ready_state_file(platform: Platform, app_identifier: &str) -> String {
    match platform {
        Platform::Macos => {
            format!("~/Library/Application Support/{app_identifier}/runtime-config.json")
        }
        Platform::Windows => format!("%APPDATA%/{app_identifier}/runtime-config.json"),
        Platform::Linux => format!("~/.config/{app_identifier}/runtime-config.json"),
    }
}

impl Artifact {
    /// Path used to locate the file under the artifacts root.
    /// Older manifests may omit `path`, in which case the name is used.
    pub fn relative_path(&self) -> &str {
        if self.path.is_empty() {
            &self.name
        } else {
            &self.path
        }
    }
}

impl SignatureInfo {
    /// Signature block for an `rsa-sha256` signature stored in `signature_file`.
    pub fn rsa_sha256(signature_file: impl Into<String>) -> Self {
        Self {
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            signature_file: signature_file.into(),
        }
    }
}
