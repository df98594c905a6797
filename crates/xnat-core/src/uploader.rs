//! Verified upload and plain download of a single file resource.
//!
//! An upload goes through
//! `Validating -> Transmitting -> CatalogFetch -> ChecksumCompare -> {Done | RolledBack}`.
//! The archive does not return a checksum from the upload call, so integrity
//! is confirmed by listing the parent resource's catalog and comparing the
//! MD5 recorded there with the local file. Any failure ends the attempt; there
//! are no retries at this layer.

use crate::catalog::{self, NO_CHECKSUM};
use crate::checksum;
use crate::error::{Result, UploadError};
use crate::query::UploadRequest;
use crate::resource::{FileResource, RemoteResource};
use crate::transport::Transport;
use std::fs::File;
use std::path::Path;

/// How a successful upload ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Archive checksum matched the local MD5.
    Verified { md5: String },
    /// No checksum to compare against, or the local file could not be re-read.
    Unverified,
}

/// Upload-and-verify driver over an injected transport.
pub struct VerifiedUploader<'a, T: Transport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> VerifiedUploader<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Uploads `resource`'s local file and verifies it against the parent catalog.
    ///
    /// On checksum mismatch the remote file is erased before the error is
    /// returned. On success the resource is marked as existing remotely.
    pub fn upload(&self, resource: &mut FileResource) -> Result<UploadOutcome> {
        let local_path = resource.local_file_path().to_path_buf();
        let name = resource.name().to_string();
        tracing::debug!(file = %name, "validating {}", local_path.display());

        if !local_path.exists() {
            return Err(UploadError::LocalFileMissing { path: local_path });
        }
        if name.is_empty() {
            return Err(UploadError::MissingName);
        }

        let request = UploadRequest::for_resource(resource);
        tracing::debug!(file = %name, "transmitting to {}", request.uri);
        self.transport
            .upload(&local_path, &request)
            .map_err(UploadError::UploadTransport)?;

        let parent_uri = resource.parent_uri();
        tracing::debug!(file = %name, "fetching catalog of {}", parent_uri);
        let records = self
            .transport
            .get(parent_uri)
            .and_then(|job| self.transport.sync_fetch(job))
            .map_err(UploadError::CatalogFetch)?;

        let remote = catalog::remote_checksum(&records, &name).to_string();
        let outcome = match local_md5(&local_path) {
            Some(local) if remote != NO_CHECKSUM => {
                tracing::debug!(file = %name, "comparing md5 local={} remote={}", local, remote);
                if local != remote {
                    self.roll_back(&request.uri, &name);
                    return Err(UploadError::IntegrityMismatch {
                        name,
                        remote,
                        local,
                    });
                }
                UploadOutcome::Verified { md5: local }
            }
            _ => {
                tracing::warn!(file = %name, "could not validate file upload");
                UploadOutcome::Unverified
            }
        };

        resource.set_exists_remotely(true);
        tracing::info!(file = %name, "uploaded to {} ({:?})", request.uri, outcome);
        Ok(outcome)
    }

    /// Fetches the archive's copy of `resource` into `dest`. No integrity check.
    pub fn download(&self, resource: &FileResource, dest: &Path) -> anyhow::Result<u64> {
        let uri = resource.uri();
        let written = self.transport.download(dest, &uri)?;
        tracing::info!("downloaded {} to {} ({} bytes)", uri, dest.display(), written);
        Ok(written)
    }

    /// Best-effort removal of a corrupt upload; failures are only logged.
    fn roll_back(&self, uri: &str, name: &str) {
        tracing::warn!(file = %name, "checksum mismatch, removing {}", uri);
        if let Err(e) = self.transport.delete(uri) {
            tracing::warn!(file = %name, "failed to remove corrupt upload {}: {:#}", uri, e);
        }
    }
}

/// MD5 of the local file, or `None` if it cannot be opened or read.
fn local_md5(path: &Path) -> Option<String> {
    let mut file = File::open(path).ok()?;
    checksum::digest_reader::<md5::Md5, _>(&mut file).ok()
}
