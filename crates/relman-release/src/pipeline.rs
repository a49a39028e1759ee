//! The build path: scan, stage, build, then write or sign.

use chrono::Utc;
use relman_core::types::{HealthContract, ReleaseManifest};
use relman_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::builder::{ManifestBuilder, MinOsMap, ReleaseMetadata};
use crate::signing::{ManifestSigner, SignatureCoordinator};
use crate::{scanner, staging};

/// Inputs of one manifest build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub bundle_dir: PathBuf,
    pub output_dir: PathBuf,
    pub manifest_filename: String,
    pub metadata: ReleaseMetadata,
    pub min_os: MinOsMap,
    pub health_contract: HealthContract,
}

/// What a successful build left on disk.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub manifest: ReleaseManifest,
    pub manifest_path: PathBuf,
    /// Present only when the manifest was signed
    pub signature_path: Option<PathBuf>,
    pub staged: Vec<PathBuf>,
}

impl BuildOutcome {
    pub fn is_signed(&self) -> bool {
        self.signature_path.is_some()
    }
}

/// Runs a full build. Any failure aborts the build.
///
/// # Errors
/// [`Error::NotFound`] for a missing bundle directory, [`Error::NoArtifacts`]
/// when it holds no installers, [`Error::UnsupportedArtifactType`] and
/// [`Error::SigningFailed`] from the later stages.
pub fn run_build(request: &BuildRequest, signer: Option<&dyn ManifestSigner>) -> Result<BuildOutcome> {
    let generated_at = Utc::now();

    let discovered = scanner::scan(&request.bundle_dir)?;
    let discovered = exclude_output_dir(discovered, &request.bundle_dir, &request.output_dir);
    if discovered.is_empty() {
        return Err(Error::no_artifacts(request.bundle_dir.display().to_string()));
    }
    info!(
        "Found {} artifact(s) under {}",
        discovered.len(),
        request.bundle_dir.display()
    );

    let staged = staging::stage_artifacts(&discovered, &request.output_dir)?;

    let manifest = ManifestBuilder::new(
        request.metadata.clone(),
        request.min_os.clone(),
        request.health_contract.clone(),
        generated_at,
    )
    .build(&staged)?;

    let manifest_path = request.output_dir.join(&request.manifest_filename);

    let (manifest, signature_path) = match signer {
        Some(signer) => {
            let (signed, signature_path) =
                SignatureCoordinator::new(signer).sign_to_disk(manifest, &manifest_path)?;
            let (manifest, _) = signed.into_parts();
            (manifest, Some(signature_path))
        }
        None => {
            manifest.write(&manifest_path)?;
            (manifest, None)
        }
    };

    info!("Wrote manifest {}", manifest_path.display());

    Ok(BuildOutcome {
        manifest,
        manifest_path,
        signature_path,
        staged,
    })
}

/// Drops files found under `output_dir` when it is nested inside the bundle,
/// so a rerun does not pick up the previous run's staged copies.
fn exclude_output_dir(
    discovered: Vec<PathBuf>,
    bundle_dir: &Path,
    output_dir: &Path,
) -> Vec<PathBuf> {
    let (Ok(bundle), Ok(output)) = (fs::canonicalize(bundle_dir), fs::canonicalize(output_dir))
    else {
        return discovered;
    };
    if bundle == output || !output.starts_with(&bundle) {
        return discovered;
    }

    discovered
        .into_iter()
        .filter(|path| {
            let inside = path
                .parent()
                .and_then(|parent| fs::canonicalize(parent).ok())
                .is_some_and(|parent| parent.starts_with(&output));
            if inside {
                debug!("Skipping previously staged {}", path.display());
            }
            !inside
        })
        .collect()
}
