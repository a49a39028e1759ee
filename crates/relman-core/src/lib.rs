//! # relman-core
//!
//! Core library for relman providing:
//! - The release manifest data model and its JSON wire format
//! - Streaming SHA256 digests of installer files
//! - Installer platform classification by file suffix
//! - Layered configuration (embedded defaults, relman.yaml, RELMAN_* env vars)

pub mod config;
pub mod error;
pub mod hash;
pub mod platform;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use platform::Platform;
pub use types::{Artifact, ReleaseManifest, RelmanConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
