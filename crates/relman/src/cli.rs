//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// relman - signed release manifests for desktop installers
#[derive(Parser, Debug)]
#[command(name = "relman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to relman.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect installers, write the release manifest, and optionally sign it
    Build(BuildArgs),

    /// Verify a manifest signature and the artifact hashes it records
    Verify(VerifyArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

// Build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory containing CI desktop build outputs
    #[arg(long)]
    pub bundle_dir: Utf8PathBuf,

    /// Output directory for copied artifacts and manifest [default: release-artifacts]
    #[arg(long)]
    pub output_dir: Option<Utf8PathBuf>,

    /// Release tag, e.g. v0.2.0
    #[arg(long)]
    pub tag: String,

    /// Git commit SHA
    #[arg(long)]
    pub commit: String,

    /// Bundled Tauri runtime version
    #[arg(long)]
    pub tauri_version: String,

    /// Rust toolchain version used for the build
    #[arg(long)]
    pub rust_version: String,

    /// Node.js runtime version used for the build
    #[arg(long)]
    pub node_version: String,

    /// Additional bundled runtime version (repeatable)
    #[arg(long = "runtime", value_name = "NAME=VERSION")]
    pub runtimes: Vec<String>,

    /// Minimum OS versions as platform=version pairs, comma separated
    #[arg(long)]
    pub min_os: Option<String>,

    /// Seconds a started instance has to become healthy [default: 30]
    #[arg(long = "health-timeout-seconds")]
    pub health_timeout: Option<u64>,

    /// Health check endpoint URL [default: http://127.0.0.1:8080/healthz]
    #[arg(long)]
    pub health_endpoint: Option<String>,

    /// PEM private key used to sign the manifest
    #[arg(long)]
    pub private_key_path: Option<Utf8PathBuf>,
}

// Verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to release-manifest.json
    #[arg(long)]
    pub manifest: Utf8PathBuf,

    /// Base directory where artifacts are stored
    #[arg(long, default_value = ".")]
    pub artifacts_dir: Utf8PathBuf,

    /// Public key PEM used to verify the manifest signature
    #[arg(long)]
    pub public_key: Option<Utf8PathBuf>,

    /// Detached signature path (defaults to manifest metadata)
    #[arg(long, requires = "public_key")]
    pub signature: Option<Utf8PathBuf>,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
