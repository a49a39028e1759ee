//! Error types for relman-core

use thiserror::Error;

/// Result type alias using relman-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, signing, or loading a release manifest
#[derive(Error, Debug)]
pub enum Error {
    /// Missing directory or file
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// File extension is not one of the recognized installer types
    #[error("Unsupported artifact type for {path}")]
    UnsupportedArtifactType { path: String },

    /// Bundle directory holds no recognized installers
    #[error("No .msi/.dmg/.AppImage artifacts found under {path}")]
    NoArtifacts { path: String },

    /// Malformed compact mapping string
    #[error("{message}")]
    Format { message: String },

    /// The signing primitive rejected or failed on the payload
    #[error("Manifest signing failed: {message}")]
    SigningFailed { message: String },

    /// PEM key could not be read or decoded
    #[error("Invalid key {path}: {message}")]
    InvalidKey { path: String, message: String },

    /// Manifest file does not exist
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: String },

    /// Manifest exists but does not match the manifest schema
    #[error("Malformed manifest {path}: {message}")]
    ManifestMalformed { path: String, message: String },

    /// Manifest lists no artifacts
    #[error("Manifest contains no artifacts: {path}")]
    EmptyManifest { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an unsupported artifact type error
    pub fn unsupported_artifact_type(path: impl Into<String>) -> Self {
        Self::UnsupportedArtifactType { path: path.into() }
    }

    /// Create a no artifacts error
    pub fn no_artifacts(path: impl Into<String>) -> Self {
        Self::NoArtifacts { path: path.into() }
    }

    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a signing failure
    pub fn signing_failed(message: impl Into<String>) -> Self {
        Self::SigningFailed {
            message: message.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a manifest not found error
    pub fn manifest_not_found(path: impl Into<String>) -> Self {
        Self::ManifestNotFound { path: path.into() }
    }

    /// Create a malformed manifest error
    pub fn manifest_malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ManifestMalformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an empty manifest error
    pub fn empty_manifest(path: impl Into<String>) -> Self {
        Self::EmptyManifest { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
