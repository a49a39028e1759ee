//! Installer platform rules.
//!
//! The suffix table here is the only definition of what counts as a release
//! artifact. Discovery and classification both go through [`recognized_suffix`]
//! so a file can never be collected and then fail to classify (or the reverse).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Target platform of an installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
}

/// Recognized installer suffixes (lowercase, with the leading dot).
pub const SUPPORTED_SUFFIXES: &[(&str, Platform)] = &[
    (".msi", Platform::Windows),
    (".dmg", Platform::Macos),
    (".appimage", Platform::Linux),
];

impl Platform {
    /// Returns all platforms.
    pub fn all() -> Vec<Platform> {
        vec![Platform::Windows, Platform::Macos, Platform::Linux]
    }

    /// Wire name used in manifests and min-OS mappings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
        }
    }

    /// Parses a wire name, ignoring case.
    pub fn parse(s: &str) -> Option<Platform> {
        match s.to_lowercase().as_str() {
            "windows" => Some(Platform::Windows),
            "macos" => Some(Platform::Macos),
            "linux" => Some(Platform::Linux),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the recognized suffix and platform for a file name, if any.
pub fn recognized_suffix(file_name: &str) -> Option<(&'static str, Platform)> {
    let lowered = file_name.to_lowercase();
    SUPPORTED_SUFFIXES
        .iter()
        .find(|(suffix, _)| lowered.ends_with(suffix))
        .copied()
}

/// True when the file name ends in a recognized installer suffix.
pub fn is_artifact(file_name: &str) -> bool {
    recognized_suffix(file_name).is_some()
}

/// Maps a file name to its target platform.
///
/// # Errors
/// Returns [`Error::UnsupportedArtifactType`] for any suffix outside
/// [`SUPPORTED_SUFFIXES`].
pub fn classify(file_name: &str) -> Result<Platform> {
    recognized_suffix(file_name)
        .map(|(_, platform)| platform)
        .ok_or_else(|| Error::unsupported_artifact_type(file_name))
}

/// Artifact type recorded in the manifest: the lowercase suffix without its dot.
pub fn artifact_type(file_name: &str) -> Result<String> {
    recognized_suffix(file_name)
        .map(|(suffix, _)| suffix.trim_start_matches('.').to_string())
        .ok_or_else(|| Error::unsupported_artifact_type(file_name))
}
