//! # relman-release
//!
//! Builds, signs, and verifies release manifests:
//! - [`scanner`] discovers installers under a bundle directory
//! - [`staging`] copies them into the output directory
//! - [`builder`] hashes the staged copies and assembles the manifest
//! - [`signing`] produces the detached two-pass RSA signature
//! - [`verify`] re-checks the signature and every artifact hash
//!
//! [`pipeline::run_build`] runs the build path end to end.

pub mod builder;
pub mod keys;
pub mod pipeline;
pub mod scanner;
pub mod signing;
pub mod staging;
pub mod verify;

pub use builder::{parse_key_value, parse_min_os, ManifestBuilder, MinOsMap, ReleaseMetadata};
pub use pipeline::{run_build, BuildOutcome, BuildRequest};
pub use signing::{
    ManifestSigner, RsaSha256Signer, RsaSha256Verifier, SignatureCoordinator, SignatureVerifier,
};
pub use verify::{ManifestVerifier, SignatureStatus, VerificationFailure, VerificationReport};
