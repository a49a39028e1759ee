//! Artifact discovery.
//!
//! Walks a bundle directory and collects every regular file whose name ends
//! in a recognized installer suffix. Discovery has no side effects.

use relman_core::platform;
use relman_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Recursively discovers installer files under `bundle_dir`.
///
/// Returns full paths sorted ascending. An empty result is not an error;
/// the caller decides whether a bundle without installers is acceptable.
///
/// # Errors
/// [`Error::NotFound`] if `bundle_dir` does not exist or is not a directory.
pub fn scan(bundle_dir: &Path) -> Result<Vec<PathBuf>> {
    if !bundle_dir.is_dir() {
        return Err(Error::not_found(bundle_dir.display().to_string()));
    }

    let mut artifacts = Vec::new();

    for entry in WalkDir::new(bundle_dir).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;

        // Symlinked installers count when they resolve to a regular file
        if !entry.path().is_file() {
            continue;
        }

        let is_match = entry
            .file_name()
            .to_str()
            .map(platform::is_artifact)
            .unwrap_or(false);

        if is_match {
            debug!("Discovered artifact: {}", entry.path().display());
            artifacts.push(entry.into_path());
        }
    }

    artifacts.sort();
    Ok(artifacts)
}
