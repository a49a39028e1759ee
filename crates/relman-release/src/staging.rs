//! Copies discovered installers into the release output directory.
//!
//! The layout is flat: every artifact lands under its base name, which is
//! also the `path` recorded in the manifest.

use relman_core::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Copies each file into `output_dir`, creating the directory if needed.
///
/// Returns the destination paths in the order of `files`, each listed once.
/// When two sources share a base name the later one overwrites the earlier
/// copy and the destination keeps its first position.
pub fn stage_artifacts(files: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let mut seen = HashSet::new();
    let mut staged = Vec::with_capacity(files.len());

    for source in files {
        let name = source
            .file_name()
            .ok_or_else(|| Error::not_found(source.display().to_string()))?;

        let duplicate = !seen.insert(name.to_os_string());
        if duplicate {
            warn!(
                "Duplicate artifact name {}; {} replaces the earlier copy",
                name.to_string_lossy(),
                source.display()
            );
        }

        let destination = output_dir.join(name);
        if is_same_file(source, &destination) {
            // Copying a file onto itself truncates it
            debug!("{} is already staged", destination.display());
        } else {
            fs::copy(source, &destination)?;
            debug!("Staged {} -> {}", source.display(), destination.display());
        }

        if !duplicate {
            staged.push(destination);
        }
    }

    Ok(staged)
}

/// True when both paths resolve to the same existing file.
pub(crate) fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
