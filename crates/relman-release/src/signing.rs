//! Detached manifest signatures.
//!
//! A signed manifest names its own signature file, so the signature has to
//! cover a document that already contains that pointer. Signing therefore
//! runs in two passes, modeled as typed states:
//!
//! ```text
//! UnsignedManifest --sign--> ProvisionallySigned --finalize--> SignedManifest
//! ```
//!
//! The first pass signs the manifest without its `signature` block and then
//! embeds the pointer. The second pass re-serializes and signs again; only
//! that signature is kept. The persisted signature authenticates the manifest
//! body plus the pointer to the signature file, never the signature bytes.

use relman_core::types::{ReleaseManifest, SignatureInfo, SIGNATURE_ALGORITHM};
use relman_core::{Error, Result};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::keys;

/// Produces detached signatures over manifest bytes.
pub trait ManifestSigner {
    /// Algorithm name recorded in the manifest.
    fn algorithm(&self) -> &str;

    /// Signs `payload`, returning the raw signature bytes.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// Checks detached signatures over manifest bytes.
pub trait SignatureVerifier {
    /// Algorithm name this verifier accepts.
    fn algorithm(&self) -> &str;

    /// Returns `Ok(false)` for a well-formed but non-matching signature.
    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<bool>;
}

/// RSA PKCS#1 v1.5 signer over a SHA256 digest.
///
/// Output matches `openssl dgst -sha256 -sign <key>`.
pub struct RsaSha256Signer {
    key: SigningKey<Sha256>,
}

impl std::fmt::Debug for RsaSha256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSha256Signer").finish_non_exhaustive()
    }
}

impl RsaSha256Signer {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self {
            key: SigningKey::<Sha256>::new(private_key),
        }
    }

    /// Loads a PEM private key from disk.
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        Ok(Self::new(keys::load_private_key(path)?))
    }
}

impl ManifestSigner for RsaSha256Signer {
    fn algorithm(&self) -> &str {
        SIGNATURE_ALGORITHM
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let signature: Signature = self
            .key
            .try_sign(payload)
            .map_err(|e| Error::signing_failed(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

/// RSA PKCS#1 v1.5 verifier over a SHA256 digest.
///
/// Accepts signatures from `openssl dgst -sha256 -sign <key>`.
pub struct RsaSha256Verifier {
    key: VerifyingKey<Sha256>,
}

impl RsaSha256Verifier {
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self {
            key: VerifyingKey::<Sha256>::new(public_key),
        }
    }

    /// Loads a PEM public key from disk.
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        Ok(Self::new(keys::load_public_key(path)?))
    }
}

impl SignatureVerifier for RsaSha256Verifier {
    fn algorithm(&self) -> &str {
        SIGNATURE_ALGORITHM
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<bool> {
        let Ok(signature) = Signature::try_from(signature) else {
            return Ok(false);
        };
        Ok(self.key.verify(payload, &signature).is_ok())
    }
}

fn sign_payload(signer: &dyn ManifestSigner, payload: &[u8]) -> Result<Vec<u8>> {
    signer.sign(payload).map_err(|e| match e {
        Error::SigningFailed { .. } => e,
        other => Error::signing_failed(other.to_string()),
    })
}

/// Manifest before any signing pass.
#[derive(Debug, Clone)]
pub struct UnsignedManifest {
    manifest: ReleaseManifest,
}

/// Manifest after the first pass: the signature pointer is embedded and the
/// first signature (over the pointer-free body) is held for inspection.
#[derive(Debug, Clone)]
pub struct ProvisionallySigned {
    manifest: ReleaseManifest,
    unsigned_bytes: Vec<u8>,
    provisional_signature: Vec<u8>,
}

/// Manifest whose final serialized bytes are covered by `signature`.
#[derive(Debug, Clone)]
pub struct SignedManifest {
    manifest: ReleaseManifest,
    bytes: Vec<u8>,
    signature: Vec<u8>,
}

impl UnsignedManifest {
    /// Wraps a manifest, dropping any existing signature block so that
    /// re-signing starts from the same body.
    pub fn new(mut manifest: ReleaseManifest) -> Self {
        manifest.signature = None;
        Self { manifest }
    }

    /// Bytes of the pointer-free manifest, as written by the first pass.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.manifest.to_json_bytes()
    }

    /// First pass: sign the body, then embed the signature pointer.
    pub fn sign(
        self,
        signer: &dyn ManifestSigner,
        signature_file: &str,
    ) -> Result<ProvisionallySigned> {
        let unsigned_bytes = self.to_bytes()?;
        let provisional_signature = sign_payload(signer, &unsigned_bytes)?;

        let mut manifest = self.manifest;
        manifest.signature = Some(SignatureInfo {
            algorithm: signer.algorithm().to_string(),
            signature_file: signature_file.to_string(),
        });

        debug!("First signing pass complete ({} bytes)", unsigned_bytes.len());

        Ok(ProvisionallySigned {
            manifest,
            unsigned_bytes,
            provisional_signature,
        })
    }
}

impl ProvisionallySigned {
    pub fn manifest(&self) -> &ReleaseManifest {
        &self.manifest
    }

    pub fn unsigned_bytes(&self) -> &[u8] {
        &self.unsigned_bytes
    }

    pub fn provisional_signature(&self) -> &[u8] {
        &self.provisional_signature
    }

    /// Second pass: re-serialize with the pointer embedded and sign again.
    /// The provisional signature is discarded.
    pub fn finalize(self, signer: &dyn ManifestSigner) -> Result<SignedManifest> {
        let bytes = self.manifest.to_json_bytes()?;
        let signature = sign_payload(signer, &bytes)?;

        debug!("Final signing pass complete ({} bytes)", bytes.len());

        Ok(SignedManifest {
            manifest: self.manifest,
            bytes,
            signature,
        })
    }
}

impl SignedManifest {
    pub fn manifest(&self) -> &ReleaseManifest {
        &self.manifest
    }

    /// Exact bytes the signature covers.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn into_parts(self) -> (ReleaseManifest, Vec<u8>) {
        (self.manifest, self.signature)
    }
}

/// Detached signature file name for a manifest file name.
pub fn signature_file_name(manifest_file_name: &str) -> String {
    format!("{}.sig", manifest_file_name)
}

/// Runs both signing passes and persists the result.
pub struct SignatureCoordinator<'a> {
    signer: &'a dyn ManifestSigner,
}

impl<'a> SignatureCoordinator<'a> {
    pub fn new(signer: &'a dyn ManifestSigner) -> Self {
        Self { signer }
    }

    /// Signs in memory; returns the updated manifest and the final signature.
    pub fn sign(
        &self,
        manifest: ReleaseManifest,
        signature_file: &str,
    ) -> Result<(ReleaseManifest, Vec<u8>)> {
        let signed = UnsignedManifest::new(manifest)
            .sign(self.signer, signature_file)?
            .finalize(self.signer)?;
        Ok(signed.into_parts())
    }

    /// Signs and writes the manifest plus its sibling `.sig` file.
    ///
    /// Each pass writes its manifest and signature to disk. If the second
    /// pass fails the first-pass files are left behind and the error is
    /// returned; the caller decides whether to clean up.
    pub fn sign_to_disk(
        &self,
        manifest: ReleaseManifest,
        manifest_path: &Path,
    ) -> Result<(SignedManifest, PathBuf)> {
        let manifest_name = manifest_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::not_found(manifest_path.display().to_string()))?;
        let signature_file = signature_file_name(manifest_name);
        let signature_path = manifest_path.with_file_name(&signature_file);

        info!("Signing manifest with {}", self.signer.algorithm());

        let unsigned = UnsignedManifest::new(manifest);
        fs::write(manifest_path, unsigned.to_bytes()?)?;

        let provisional = unsigned.sign(self.signer, &signature_file)?;
        fs::write(&signature_path, provisional.provisional_signature())?;

        let signed = provisional.finalize(self.signer)?;
        fs::write(manifest_path, signed.bytes())?;
        fs::write(&signature_path, signed.signature())?;

        info!("Wrote detached signature {}", signature_path.display());
        Ok((signed, signature_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use relman_core::types::{HealthContract, ReleaseInfo, SCHEMA_VERSION};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const PRIVATE_KEY: &str = include_str!("../tests/fixtures/signing-key.pem");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/signing-key.pub.pem");
    const OTHER_PUBLIC_KEY: &str = include_str!("../tests/fixtures/other-key.pub.pem");

    fn signer() -> RsaSha256Signer {
        RsaSha256Signer::new(keys::parse_private_key(PRIVATE_KEY, "test").unwrap())
    }

    fn verifier(pem: &str) -> RsaSha256Verifier {
        RsaSha256Verifier::new(keys::parse_public_key(pem, "test").unwrap())
    }

    fn manifest() -> ReleaseManifest {
        ReleaseManifest {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            release: ReleaseInfo {
                tag: "v0.2.0".to_string(),
                commit: "abc123".to_string(),
            },
            bundled_runtime_versions: BTreeMap::new(),
            health_contract: HealthContract::new("id", "--bootstrap", "http://x", 30),
            artifacts: Vec::new(),
            signature: None,
            extra: Default::default(),
        }
    }

    struct FailingSigner;

    impl ManifestSigner for FailingSigner {
        fn algorithm(&self) -> &str {
            "rsa-sha256"
        }

        fn sign(&self, _payload: &[u8]) -> Result<Vec<u8>> {
            Err(Error::Io(std::io::Error::other("signing service unavailable")))
        }
    }

    #[test]
    fn test_rsa_sign_and_verify() {
        let signature = signer().sign(b"payload").unwrap();
        assert_eq!(signature.len(), 256);
        assert!(verifier(PUBLIC_KEY).verify(b"payload", &signature).unwrap());
        assert!(!verifier(PUBLIC_KEY).verify(b"payload!", &signature).unwrap());
        assert!(!verifier(OTHER_PUBLIC_KEY).verify(b"payload", &signature).unwrap());
        assert!(!verifier(PUBLIC_KEY).verify(b"payload", b"short").unwrap());
    }

    #[test]
    fn test_two_pass_signature_covers_final_bytes() {
        let provisional = UnsignedManifest::new(manifest())
            .sign(&signer(), "release-manifest.json.sig")
            .unwrap();

        let pointer = provisional.manifest().signature.clone().unwrap();
        assert_eq!(pointer.algorithm, "rsa-sha256");
        assert_eq!(pointer.signature_file, "release-manifest.json.sig");

        let unsigned_bytes = provisional.unsigned_bytes().to_vec();
        let first = provisional.provisional_signature().to_vec();
        let signed = provisional.finalize(&signer()).unwrap();

        let parsed = ReleaseManifest::from_json(signed.bytes()).unwrap();
        assert_eq!(&parsed, signed.manifest());
        assert!(parsed.is_signed());

        let verifier = verifier(PUBLIC_KEY);
        assert!(verifier.verify(signed.bytes(), signed.signature()).unwrap());
        // The first pass covered the pointer-free body only
        assert!(verifier.verify(&unsigned_bytes, &first).unwrap());
        assert!(!verifier.verify(signed.bytes(), &first).unwrap());
    }

    #[test]
    fn test_resigning_is_idempotent() {
        let coordinator_signer = signer();
        let coordinator = SignatureCoordinator::new(&coordinator_signer);

        let (signed_once, sig_once) = coordinator.sign(manifest(), "m.sig").unwrap();
        let (signed_twice, sig_twice) = coordinator.sign(signed_once.clone(), "m.sig").unwrap();

        assert_eq!(signed_once, signed_twice);
        assert_eq!(sig_once, sig_twice);
    }

    #[test]
    fn test_sign_to_disk_writes_sibling_signature() {
        let temp_dir = TempDir::new().unwrap();
        let manifest_path = temp_dir.path().join("release-manifest.json");
        let rsa_signer = signer();

        let (signed, signature_path) = SignatureCoordinator::new(&rsa_signer)
            .sign_to_disk(manifest(), &manifest_path)
            .unwrap();

        assert_eq!(signature_path, temp_dir.path().join("release-manifest.json.sig"));
        let on_disk = fs::read(&manifest_path).unwrap();
        let signature = fs::read(&signature_path).unwrap();
        assert_eq!(on_disk, signed.bytes());
        assert!(verifier(PUBLIC_KEY).verify(&on_disk, &signature).unwrap());
    }

    #[test]
    fn test_signer_failure_maps_to_signing_failed() {
        let temp_dir = TempDir::new().unwrap();
        let manifest_path = temp_dir.path().join("release-manifest.json");

        let result = SignatureCoordinator::new(&FailingSigner).sign_to_disk(manifest(), &manifest_path);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::SigningFailed { .. }));
        assert!(err.to_string().contains("signing service unavailable"));

        // The unsigned first-pass manifest stays on disk
        let left = ReleaseManifest::load(&manifest_path).unwrap();
        assert!(!left.is_signed());
    }
}
