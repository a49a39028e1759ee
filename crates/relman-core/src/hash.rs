//! Streaming SHA256 digests of artifact files.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::Result;

/// Read size used while hashing (1 MiB).
pub const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Calculates the lowercase hex SHA256 digest of a file.
///
/// The file is read in [`HASH_CHUNK_SIZE`] chunks, so memory use does not
/// grow with the installer size. The handle is dropped on every return path,
/// including a read error part way through the file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    sha256_reader(BufReader::with_capacity(HASH_CHUNK_SIZE, file))
}

/// Digest of everything `reader` yields. Interrupted reads are retried.
pub fn sha256_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest of an in-memory buffer, same encoding as [`sha256_file`].
pub fn sha256_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Compares two hex digests, ignoring case.
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
