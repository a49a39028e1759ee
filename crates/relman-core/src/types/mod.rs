//! Type definitions for release manifests and configuration

mod config_types;
mod manifest;

pub use config_types::{HealthConfig, RelmanConfig};
pub use manifest::{
    ready_state_file, Artifact, HealthContract, ReleaseInfo, ReleaseManifest, SignatureInfo,
    MANIFEST_FILENAME, SCHEMA_VERSION, SIGNATURE_ALGORITHM, UNSPECIFIED_OS_VERSION,
};
