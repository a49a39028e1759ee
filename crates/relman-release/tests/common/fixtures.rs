//! Release workspace fixtures

#![allow(dead_code)]

use anyhow::{Context, Result};
use relman_core::types::HealthContract;
use relman_release::{
    parse_min_os, BuildRequest, ReleaseMetadata, RsaSha256Signer, RsaSha256Verifier,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MANIFEST_FILENAME: &str = "release-manifest.json";
pub const DEFAULT_MIN_OS: &str = "windows=10.0.19045,macos=13.0,linux=Ubuntu 22.04";

pub const DMG_BYTES: &[u8] = b"macOS disk image payload";
pub const MSI_BYTES: &[u8] = b"Windows installer payload";

/// Directory holding committed keys and signed samples
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn signer() -> RsaSha256Signer {
    RsaSha256Signer::from_pem_file(&fixtures_dir().join("signing-key.pem"))
        .expect("signing fixture key")
}

pub fn verifier() -> RsaSha256Verifier {
    RsaSha256Verifier::from_pem_file(&fixtures_dir().join("signing-key.pub.pem"))
        .expect("public fixture key")
}

pub fn other_verifier() -> RsaSha256Verifier {
    RsaSha256Verifier::from_pem_file(&fixtures_dir().join("other-key.pub.pem"))
        .expect("unrelated fixture key")
}

/// A bundle directory and an output directory inside one temp dir
pub struct ReleaseWorkspace {
    temp_dir: TempDir,
}

impl ReleaseWorkspace {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp directory")?;
        fs::create_dir_all(temp_dir.path().join("bundle"))
            .context("Failed to create bundle directory")?;
        Ok(Self { temp_dir })
    }

    /// Workspace with `dmg/app.dmg` and `msi/setup.msi` in the bundle
    pub fn with_two_installers() -> Result<Self> {
        let workspace = Self::new()?;
        workspace.add_bundle_file("dmg/app.dmg", DMG_BYTES)?;
        workspace.add_bundle_file("msi/setup.msi", MSI_BYTES)?;
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn bundle_dir(&self) -> PathBuf {
        self.root().join("bundle")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("release-artifacts")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir().join(MANIFEST_FILENAME)
    }

    pub fn add_bundle_file(&self, relative: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.bundle_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Flips the first byte of a staged artifact
    pub fn corrupt_output_file(&self, name: &str) -> Result<()> {
        let path = self.output_dir().join(name);
        let mut bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        bytes[0] ^= 0xff;
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn request(&self) -> BuildRequest {
        BuildRequest {
            bundle_dir: self.bundle_dir(),
            output_dir: self.output_dir(),
            manifest_filename: MANIFEST_FILENAME.to_string(),
            metadata: ReleaseMetadata::new("v0.2.0", "4f2a9c1")
                .with_runtime("tauri", "2.1.0")
                .with_runtime("rust", "1.80.0")
                .with_runtime("node", "20.11.0"),
            min_os: parse_min_os(DEFAULT_MIN_OS).expect("default min-os mapping"),
            health_contract: HealthContract::new(
                "com.example.desktop",
                "--bootstrap",
                "http://127.0.0.1:8080/healthz",
                30,
            ),
        }
    }
}
