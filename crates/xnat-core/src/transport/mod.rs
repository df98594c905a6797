//! Archive transport: the operations the uploader needs from a session.
//!
//! Catalog queries follow a submit/await pattern: `get` registers the query and
//! hands back a [`JobHandle`], `sync_fetch` blocks until its records are in.
//! Every handle must be passed to `sync_fetch` exactly once; that call releases
//! it whether or not the fetch succeeds.

mod session;

pub use session::CurlSession;

use crate::catalog::CatalogRecord;
use crate::query::UploadRequest;
use anyhow::Result;
use std::path::Path;

/// Ticket for a submitted catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(pub u64);

/// Blocking operations against the archive. URIs are relative to the archive root.
pub trait Transport: Send + Sync {
    /// Sends the local file as the request body of `request`. The request URI is
    /// a path (each segment escaped on the wire); its params become the query.
    fn upload(&self, local_path: &Path, request: &UploadRequest) -> Result<()>;

    /// Submits a catalog query for the resource at `uri`.
    ///
    /// The returned handle stays registered until it is passed to [`sync_fetch`];
    /// callers must always pair the two.
    ///
    /// [`sync_fetch`]: Transport::sync_fetch
    fn get(&self, uri: &str) -> Result<JobHandle>;

    /// Waits for a submitted query and returns its records in catalog order.
    /// Consumes the handle: a second call with the same handle fails.
    fn sync_fetch(&self, job: JobHandle) -> Result<Vec<CatalogRecord>>;

    /// Streams the resource at `uri` into `dest`. Returns bytes written.
    fn download(&self, dest: &Path, uri: &str) -> Result<u64>;

    /// Erases the resource at `uri`.
    fn delete(&self, uri: &str) -> Result<()>;

    /// Whether the resource at `uri` exists.
    fn exists(&self, uri: &str) -> Result<bool>;
}
