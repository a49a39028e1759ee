//! Build command

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use relman_core::types::HealthContract;
use relman_core::RelmanConfig;
use relman_release::{
    parse_key_value, parse_min_os, run_build, BuildRequest, ManifestSigner, ReleaseMetadata,
    RsaSha256Signer,
};

use crate::cli::BuildArgs;
use crate::output;

pub fn run(args: BuildArgs, config_path: Option<&Utf8Path>, quiet: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let request = build_request(&args, &config)?;

    let signer = match &args.private_key_path {
        Some(path) => Some(load_signer(path)?),
        None => None,
    };

    let spinner = output::spinner_unless_quiet("Building release manifest...", quiet);
    let result = run_build(&request, signer.as_ref().map(|s| s as &dyn ManifestSigner));
    spinner.finish_and_clear();
    let outcome = result?;

    output::success(&format!(
        "Generated manifest: {}",
        outcome.manifest_path.display()
    ));
    output::kv(
        "Artifacts",
        &format!(
            "{} collected into {}",
            outcome.manifest.artifacts.len(),
            request.output_dir.display()
        ),
    );
    match &outcome.signature_path {
        Some(path) => output::kv("Signature", &path.display().to_string()),
        None => output::kv("Signature", "unsigned"),
    }

    Ok(())
}

/// Load the signing key; the error is a single line naming the key file
fn load_signer(path: &Utf8Path) -> Result<RsaSha256Signer> {
    RsaSha256Signer::from_pem_file(path.as_std_path())
        .map_err(|e| anyhow!("Failed to load private key: {}", e))
}

/// Merge CLI flags over the resolved configuration
fn build_request(args: &BuildArgs, config: &RelmanConfig) -> Result<BuildRequest> {
    let mut metadata = ReleaseMetadata::new(&args.tag, &args.commit)
        .with_runtime("tauri", &args.tauri_version)
        .with_runtime("rust", &args.rust_version)
        .with_runtime("node", &args.node_version);

    for entry in &args.runtimes {
        let (name, version) = parse_key_value(entry)?;
        metadata = metadata.with_runtime(name, version);
    }

    let min_os = parse_min_os(args.min_os.as_deref().unwrap_or(&config.min_os))?;

    let health_contract = HealthContract::new(
        &config.app_identifier,
        &config.health.bootstrap_argument,
        args.health_endpoint
            .clone()
            .unwrap_or_else(|| config.health.endpoint.clone()),
        args.health_timeout.unwrap_or(config.health.timeout_secs),
    );

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.as_str().into());

    Ok(BuildRequest {
        bundle_dir: args.bundle_dir.clone().into_std_path_buf(),
        output_dir: output_dir.into_std_path_buf(),
        manifest_filename: config.manifest_filename.clone(),
        metadata,
        min_os,
        health_contract,
    })
}
