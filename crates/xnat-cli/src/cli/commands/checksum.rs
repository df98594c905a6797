//! Checksum command: MD5 (what the archive catalog records) and SHA-256 of a local file.

use anyhow::Result;
use std::path::Path;
use xnat_core::checksum;

/// Compute and print both digests of the given file, md5sum/sha256sum style.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let md5 = checksum::md5_path(path)?;
    let sha256 = checksum::sha256_path(path)?;
    println!("md5     {}  {}", md5, path.display());
    println!("sha256  {}  {}", sha256, path.display());
    Ok(())
}
