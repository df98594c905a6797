//! Failure taxonomy for a verified upload attempt.

use std::path::PathBuf;
use thiserror::Error;

/// Why an upload attempt ended without a committed file on the archive.
///
/// A skipped verification is not an error; see [`crate::uploader::UploadOutcome`].
#[derive(Debug, Error)]
pub enum UploadError {
    /// Local file does not exist. Nothing was sent.
    #[error("file \"{}\" does not exist", path.display())]
    LocalFileMissing { path: PathBuf },

    /// Resource has no name, so no upload URI can be formed. Nothing was sent.
    #[error("file resource has no name")]
    MissingName,

    /// Transfer failed; nothing was committed, so no rollback is attempted.
    #[error("upload failed: {0:#}")]
    UploadTransport(anyhow::Error),

    /// Upload went through but the catalog could not be fetched for verification.
    #[error("catalog fetch after upload failed: {0:#}")]
    CatalogFetch(anyhow::Error),

    /// Archive checksum differs from the local one. The remote copy was erased (best-effort).
    #[error("upload of {name} is corrupt: archive has md5 {remote}, local file has {local}")]
    IntegrityMismatch {
        name: String,
        remote: String,
        local: String,
    },
}

pub type Result<T> = std::result::Result<T, UploadError>;
