//! Manifest verification.
//!
//! Checks the detached signature (when a verifier is configured) and
//! re-hashes every listed artifact. Problems are collected into a
//! [`VerificationReport`] rather than stopping at the first one. Only an
//! unreadable or empty manifest aborts verification.

use relman_core::hash::{digests_match, sha256_file};
use relman_core::types::ReleaseManifest;
use relman_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

use crate::signing::SignatureVerifier;

/// A single problem found during verification.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum VerificationFailure {
    /// No override given and the manifest names no signature file
    #[error("No signature file provided and manifest.signature.signature_file is missing")]
    SignatureFileUnresolved,

    /// Resolved signature file does not exist
    #[error("Signature file not found: {}", path.display())]
    SignatureFileMissing { path: PathBuf },

    /// Signature does not match the manifest bytes and public key
    #[error("Manifest signature verification failed: {reason}")]
    SignatureInvalid { reason: String },

    /// Listed artifact is absent under the artifacts root
    #[error("Missing artifact: {}", path.display())]
    MissingArtifact { name: String, path: PathBuf },

    /// Artifact exists but could not be read
    #[error("Unreadable artifact {}: {reason}", path.display())]
    ArtifactUnreadable {
        name: String,
        path: PathBuf,
        reason: String,
    },

    /// Artifact bytes differ from the recorded digest
    #[error("Hash mismatch for {name}: expected {expected}, got {actual}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

impl VerificationFailure {
    /// True for failures raised by the signature check.
    pub fn is_signature_failure(&self) -> bool {
        matches!(
            self,
            Self::SignatureFileUnresolved
                | Self::SignatureFileMissing { .. }
                | Self::SignatureInvalid { .. }
        )
    }
}

/// Outcome of the signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    /// No verifier was configured
    NotChecked,
    Verified,
    Failed,
}

/// Result of verifying one manifest.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub manifest_path: PathBuf,
    pub signature: SignatureStatus,
    pub artifacts_checked: usize,
    /// Failures in check order: signature first, then artifacts in manifest order
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    /// True when no failure was recorded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of artifacts that hashed to their recorded digest.
    pub fn artifacts_passed(&self) -> usize {
        let artifact_failures = self
            .failures
            .iter()
            .filter(|f| !f.is_signature_failure())
            .count();
        self.artifacts_checked - artifact_failures
    }
}

/// Verifies manifests against an artifacts directory.
pub struct ManifestVerifier {
    artifacts_root: PathBuf,
    signature_verifier: Option<Box<dyn SignatureVerifier>>,
    signature_override: Option<PathBuf>,
}

impl ManifestVerifier {
    /// Verifier that resolves artifact paths under `artifacts_root`.
    pub fn new(artifacts_root: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_root: artifacts_root.into(),
            signature_verifier: None,
            signature_override: None,
        }
    }

    /// Enables the signature check.
    pub fn with_signature_verifier(mut self, verifier: impl SignatureVerifier + 'static) -> Self {
        self.signature_verifier = Some(Box::new(verifier));
        self
    }

    /// Uses `path` instead of the signature file named in the manifest.
    /// Relative paths resolve against the manifest directory.
    pub fn with_signature_override(mut self, path: Option<PathBuf>) -> Self {
        self.signature_override = path;
        self
    }

    /// Verifies the manifest at `manifest_path`.
    ///
    /// # Errors
    /// [`Error::ManifestNotFound`], [`Error::ManifestMalformed`] and
    /// [`Error::EmptyManifest`] abort verification. Every other problem is
    /// recorded in the returned report.
    pub fn verify(&self, manifest_path: &Path) -> Result<VerificationReport> {
        if !manifest_path.is_file() {
            return Err(Error::manifest_not_found(manifest_path.display().to_string()));
        }

        // Parse and signature-check the same bytes
        let manifest_bytes = fs::read(manifest_path)?;
        let manifest = ReleaseManifest::from_json(&manifest_bytes).map_err(|e| {
            Error::manifest_malformed(manifest_path.display().to_string(), e.to_string())
        })?;

        info!(
            "Verifying manifest {} ({} {})",
            manifest_path.display(),
            manifest.release.tag,
            manifest.release.commit
        );

        let mut failures = Vec::new();

        let signature = match &self.signature_verifier {
            Some(verifier) => {
                let checked = self.check_signature(
                    verifier.as_ref(),
                    manifest_path,
                    &manifest,
                    &manifest_bytes,
                );
                match checked {
                    Ok(()) => {
                        info!("Manifest signature verified");
                        SignatureStatus::Verified
                    }
                    Err(failure) => {
                        warn!("{}", failure);
                        failures.push(failure);
                        SignatureStatus::Failed
                    }
                }
            }
            None => SignatureStatus::NotChecked,
        };

        if manifest.artifacts.is_empty() {
            // Carry the signature result so it is not lost with the report
            let mut subject = manifest_path.display().to_string();
            if let Some(failure) = failures.first() {
                subject = format!("{} ({})", subject, failure);
            }
            return Err(Error::empty_manifest(subject));
        }

        for artifact in &manifest.artifacts {
            let path = self.artifacts_root.join(artifact.relative_path());

            if !path.exists() {
                failures.push(VerificationFailure::MissingArtifact {
                    name: artifact.name.clone(),
                    path,
                });
                continue;
            }

            let actual = match sha256_file(&path) {
                Ok(digest) => digest,
                Err(e) => {
                    failures.push(VerificationFailure::ArtifactUnreadable {
                        name: artifact.name.clone(),
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if digests_match(&artifact.sha256, &actual) {
                debug!("{} ok", artifact.name);
            } else {
                failures.push(VerificationFailure::HashMismatch {
                    name: artifact.name.clone(),
                    expected: artifact.sha256.clone(),
                    actual,
                });
            }
        }

        Ok(VerificationReport {
            manifest_path: manifest_path.to_path_buf(),
            signature,
            artifacts_checked: manifest.artifacts.len(),
            failures,
        })
    }

    fn check_signature(
        &self,
        verifier: &dyn SignatureVerifier,
        manifest_path: &Path,
        manifest: &ReleaseManifest,
        manifest_bytes: &[u8],
    ) -> std::result::Result<(), VerificationFailure> {
        let manifest_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let signature_path = self
            .signature_override
            .clone()
            .or_else(|| {
                manifest
                    .signature
                    .as_ref()
                    .map(|s| PathBuf::from(&s.signature_file))
            })
            .map(|p| if p.is_absolute() { p } else { manifest_dir.join(p) })
            .ok_or(VerificationFailure::SignatureFileUnresolved)?;

        if !signature_path.is_file() {
            return Err(VerificationFailure::SignatureFileMissing {
                path: signature_path,
            });
        }

        if let Some(info) = &manifest.signature {
            if info.algorithm != verifier.algorithm() {
                return Err(VerificationFailure::SignatureInvalid {
                    reason: format!(
                        "manifest declares {}, verifier expects {}",
                        info.algorithm,
                        verifier.algorithm()
                    ),
                });
            }
        }

        let signature =
            fs::read(&signature_path).map_err(|e| VerificationFailure::SignatureInvalid {
                reason: format!("cannot read {}: {}", signature_path.display(), e),
            })?;

        match verifier.verify(manifest_bytes, &signature) {
            Ok(true) => Ok(()),
            Ok(false) => Err(VerificationFailure::SignatureInvalid {
                reason: "signature does not match manifest and public key".to_string(),
            }),
            Err(e) => Err(VerificationFailure::SignatureInvalid {
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relman_core::hash::sha256_bytes;
    use tempfile::TempDir;

    struct StaticVerifier(bool);

    impl SignatureVerifier for StaticVerifier {
        fn algorithm(&self) -> &str {
            "rsa-sha256"
        }

        fn verify(&self, _payload: &[u8], _signature: &[u8]) -> Result<bool> {
            Ok(self.0)
        }
    }

    fn write_manifest(dir: &Path, artifacts: &[(&str, &str)], signature_file: Option<&str>) -> PathBuf {
        let artifacts: Vec<_> = artifacts
            .iter()
            .map(|(name, sha)| {
                serde_json::json!({
                    "name": name, "path": name, "platform": "macos", "type": "dmg",
                    "sha256": sha, "size_bytes": 1, "minimum_os_version": "13.0"
                })
            })
            .collect();

        let mut manifest = serde_json::json!({
            "schema_version": "1.0.0",
            "generated_at": "2025-01-01T00:00:00Z",
            "release": {"tag": "v1", "commit": "c1"},
            "bundled_runtime_versions": {},
            "health_contract": {
                "bootstrap_argument": "--bootstrap",
                "ready_state_files": {},
                "health_endpoint": "http://x",
                "startup_timeout_seconds": 30
            },
            "artifacts": artifacts,
        });
        if let Some(file) = signature_file {
            manifest["signature"] =
                serde_json::json!({"algorithm": "rsa-sha256", "signature_file": file});
        }

        let path = dir.join("release-manifest.json");
        fs::write(&path, serde_json::to_vec_pretty(&manifest).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_clean_report() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.dmg"), b"a").unwrap();
        let manifest = write_manifest(temp_dir.path(), &[("a.dmg", &sha256_bytes(b"a"))], None);

        let report = ManifestVerifier::new(temp_dir.path()).verify(&manifest).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.signature, SignatureStatus::NotChecked);
        assert_eq!(report.artifacts_checked, 1);
        assert_eq!(report.artifacts_passed(), 1);
    }

    #[test]
    fn test_collects_every_artifact_failure_in_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.dmg"), b"a").unwrap();
        fs::write(temp_dir.path().join("c.dmg"), b"tampered").unwrap();
        let manifest = write_manifest(
            temp_dir.path(),
            &[
                ("a.dmg", &sha256_bytes(b"a").to_uppercase()),
                ("b.dmg", &sha256_bytes(b"b")),
                ("c.dmg", &sha256_bytes(b"c")),
            ],
            None,
        );

        let report = ManifestVerifier::new(temp_dir.path()).verify(&manifest).unwrap();
        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            &report.failures[0],
            VerificationFailure::MissingArtifact { name, .. } if name == "b.dmg"
        ));
        assert_eq!(
            report.failures[1],
            VerificationFailure::HashMismatch {
                name: "c.dmg".to_string(),
                expected: sha256_bytes(b"c"),
                actual: sha256_bytes(b"tampered"),
            }
        );
        assert_eq!(report.artifacts_passed(), 1);
    }

    #[test]
    fn test_signature_failure_does_not_skip_hash_checks() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = write_manifest(
            temp_dir.path(),
            &[("gone.dmg", &sha256_bytes(b"x"))],
            Some("release-manifest.json.sig"),
        );
        fs::write(temp_dir.path().join("release-manifest.json.sig"), b"sig").unwrap();

        let report = ManifestVerifier::new(temp_dir.path())
            .with_signature_verifier(StaticVerifier(false))
            .verify(&manifest)
            .unwrap();

        assert_eq!(report.signature, SignatureStatus::Failed);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0], VerificationFailure::SignatureInvalid { .. }));
        assert!(matches!(report.failures[1], VerificationFailure::MissingArtifact { .. }));
    }

    #[test]
    fn test_signature_file_resolution() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.dmg"), b"a").unwrap();
        let sha = sha256_bytes(b"a");

        // No pointer, no override
        let manifest = write_manifest(temp_dir.path(), &[("a.dmg", &sha)], None);
        let report = ManifestVerifier::new(temp_dir.path())
            .with_signature_verifier(StaticVerifier(true))
            .verify(&manifest)
            .unwrap();
        assert_eq!(report.failures, vec![VerificationFailure::SignatureFileUnresolved]);

        // Pointer to a file that does not exist
        let manifest = write_manifest(temp_dir.path(), &[("a.dmg", &sha)], Some("missing.sig"));
        let report = ManifestVerifier::new(temp_dir.path())
            .with_signature_verifier(StaticVerifier(true))
            .verify(&manifest)
            .unwrap();
        assert_eq!(
            report.failures,
            vec![VerificationFailure::SignatureFileMissing {
                path: temp_dir.path().join("missing.sig")
            }]
        );

        // Relative override resolves next to the manifest
        fs::write(temp_dir.path().join("override.sig"), b"sig").unwrap();
        let report = ManifestVerifier::new(temp_dir.path())
            .with_signature_verifier(StaticVerifier(true))
            .with_signature_override(Some(PathBuf::from("override.sig")))
            .verify(&manifest)
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.signature, SignatureStatus::Verified);
    }

    #[test]
    fn test_fatal_preconditions() {
        let temp_dir = TempDir::new().unwrap();
        let verifier = ManifestVerifier::new(temp_dir.path());

        let missing = temp_dir.path().join("release-manifest.json");
        assert!(matches!(verifier.verify(&missing), Err(Error::ManifestNotFound { .. })));

        fs::write(&missing, b"{\"artifacts\": []}").unwrap();
        assert!(matches!(verifier.verify(&missing), Err(Error::ManifestMalformed { .. })));

        let empty = write_manifest(temp_dir.path(), &[], None);
        assert!(matches!(verifier.verify(&empty), Err(Error::EmptyManifest { .. })));
    }

    #[test]
    fn test_empty_manifest_error_keeps_signature_failure() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = write_manifest(temp_dir.path(), &[], Some("release-manifest.json.sig"));
        fs::write(temp_dir.path().join("release-manifest.json.sig"), b"sig").unwrap();

        let err = ManifestVerifier::new(temp_dir.path())
            .with_signature_verifier(StaticVerifier(false))
            .verify(&manifest)
            .unwrap_err();

        assert!(matches!(err, Error::EmptyManifest { .. }));
        let message = err.to_string();
        assert!(message.starts_with("Manifest contains no artifacts: "));
        assert!(message.contains("Manifest signature verification failed"));
    }

    #[test]
    fn test_failure_messages() {
        let failure = VerificationFailure::HashMismatch {
            name: "setup.msi".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "Hash mismatch for setup.msi: expected aa, got bb"
        );
        assert!(!failure.is_signature_failure());
        assert!(VerificationFailure::SignatureFileUnresolved.is_signature_failure());
    }
}
