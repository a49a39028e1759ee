//! Manifest assembly.
//!
//! [`ManifestBuilder`] hashes the staged copies of each installer (what ships
//! is what is hashed) and assembles the [`ReleaseManifest`] document.

use chrono::{DateTime, Utc};
use relman_core::hash::sha256_file;
use relman_core::platform::{self, Platform};
use relman_core::types::{
    Artifact, HealthContract, ReleaseInfo, ReleaseManifest, SCHEMA_VERSION,
    UNSPECIFIED_OS_VERSION,
};
use relman_core::{Error, Result};
use serde_json::Map;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Platform name -> minimum OS version.
pub type MinOsMap = BTreeMap<String, String>;

/// Release identity and bundled runtime versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    pub tag: String,
    pub commit: String,
    pub runtime_versions: BTreeMap<String, String>,
}

impl ReleaseMetadata {
    /// Creates metadata with no runtime versions.
    pub fn new(tag: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            commit: commit.into(),
            runtime_versions: BTreeMap::new(),
        }
    }

    /// Records a bundled runtime component version.
    pub fn with_runtime(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.runtime_versions.insert(name.into(), version.into());
        self
    }
}

/// Parses `platform=version[,platform=version...]`.
///
/// Segments and both sides of `=` are trimmed; blank segments are skipped.
/// Only the first `=` splits, so versions may contain `=`.
///
/// # Errors
/// [`Error::Format`] for a non-blank segment without `=`.
pub fn parse_min_os(value: &str) -> Result<MinOsMap> {
    let mut mapping = MinOsMap::new();

    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (platform, version) = part.split_once('=').ok_or_else(|| {
            Error::format(format!(
                "Invalid --min-os entry '{}', expected platform=version",
                part
            ))
        })?;

        let platform = platform.trim();
        if Platform::parse(platform).is_none() {
            warn!("Minimum OS entry for unknown platform '{}' is ignored", platform);
        }
        mapping.insert(platform.to_string(), version.trim().to_string());
    }

    Ok(mapping)
}

/// Parses a single `name=version` pair (used for extra runtime versions).
pub fn parse_key_value(value: &str) -> Result<(String, String)> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| Error::format(format!("Invalid entry '{}', expected name=version", value)))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::format(format!(
            "Invalid entry '{}', name must not be empty",
            value
        )));
    }
    Ok((key.to_string(), val.trim().to_string()))
}

/// Assembles a release manifest from staged artifact files.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    metadata: ReleaseMetadata,
    min_os: MinOsMap,
    health_contract: HealthContract,
    generated_at: DateTime<Utc>,
}

impl ManifestBuilder {
    /// Creates a builder.
    ///
    /// `generated_at` is captured once by the caller at build start and is
    /// shared by the whole document.
    pub fn new(
        metadata: ReleaseMetadata,
        min_os: MinOsMap,
        health_contract: HealthContract,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            metadata,
            min_os,
            health_contract,
            generated_at,
        }
    }

    /// Builds the manifest.
    ///
    /// Each path must point at the copy that will ship. Artifacts keep the
    /// order of `artifact_files`. Any unclassifiable file aborts the build.
    pub fn build(&self, artifact_files: &[PathBuf]) -> Result<ReleaseManifest> {
        info!("Building manifest for {} artifact(s)", artifact_files.len());

        let artifacts = artifact_files
            .iter()
            .map(|path| self.describe_artifact(path))
            .collect::<Result<Vec<_>>>()?;

        Ok(ReleaseManifest {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: self.generated_at,
            release: ReleaseInfo {
                tag: self.metadata.tag.clone(),
                commit: self.metadata.commit.clone(),
            },
            bundled_runtime_versions: self.metadata.runtime_versions.clone(),
            health_contract: self.health_contract.clone(),
            artifacts,
            signature: None,
            extra: Map::new(),
        })
    }

    fn describe_artifact(&self, path: &Path) -> Result<Artifact> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::unsupported_artifact_type(path.display().to_string()))?
            .to_string();

        let platform = platform::classify(&name)?;
        let artifact_type = platform::artifact_type(&name)?;
        let sha256 = sha256_file(path)?;
        let size_bytes = fs::metadata(path)?.len();

        let minimum_os_version = self
            .min_os
            .get(platform.as_str())
            .cloned()
            .unwrap_or_else(|| UNSPECIFIED_OS_VERSION.to_string());

        debug!("{} [{}] sha256={} size={}", name, platform, sha256, size_bytes);

        Ok(Artifact {
            path: name.clone(),
            name,
            platform,
            artifact_type,
            sha256,
            size_bytes,
            minimum_os_version,
        })
    }
}
