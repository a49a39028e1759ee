//! Verify command

use anyhow::{anyhow, Result};
use relman_release::{ManifestVerifier, RsaSha256Verifier, SignatureStatus};

use crate::cli::VerifyArgs;
use crate::output;

pub fn run(args: VerifyArgs) -> Result<()> {
    let mut verifier = ManifestVerifier::new(args.artifacts_dir.as_std_path());

    if let Some(key_path) = &args.public_key {
        let signature_verifier = RsaSha256Verifier::from_pem_file(key_path.as_std_path())
            .map_err(|e| anyhow!("Failed to load public key: {}", e))?;
        verifier = verifier
            .with_signature_verifier(signature_verifier)
            .with_signature_override(args.signature.clone().map(|p| p.into_std_path_buf()));
    }

    let report = verifier.verify(args.manifest.as_std_path())?;

    match report.signature {
        SignatureStatus::Verified => output::success("Manifest signature verification passed"),
        SignatureStatus::NotChecked => {
            output::warning("No --public-key given; manifest signature not checked")
        }
        SignatureStatus::Failed => {}
    }

    if !report.is_clean() {
        for failure in &report.failures {
            output::error(&failure.to_string());
        }
        std::process::exit(1);
    }

    output::success(&format!(
        "Artifact hash verification passed for {} file(s)",
        report.artifacts_checked
    ));
    Ok(())
}
