//! libcurl-backed archive session.
//!
//! One `Easy` handle per call, blocking in the current thread; call from
//! `spawn_blocking` if used from async code.

use super::{JobHandle, Transport};
use crate::catalog::{self, CatalogRecord};
use crate::config::{TimeoutConfig, XnatConfig};
use crate::query::UploadRequest;
use anyhow::{Context, Result};
use curl::easy::{Easy, List, ReadError};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Response bodies longer than this are cut when quoted in errors.
const ERROR_BODY_LIMIT: usize = 512;

/// Session against one archive. Safe to share between threads.
#[derive(Debug)]
pub struct CurlSession {
    base_url: Url,
    timeouts: TimeoutConfig,
    next_job: AtomicU64,
    pending: Mutex<HashMap<JobHandle, String>>,
}

impl CurlSession {
    pub fn new(base_url: &str, timeouts: TimeoutConfig) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid base URL {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("base URL {} cannot carry a path", base_url);
        }
        Ok(Self {
            base_url,
            timeouts,
            next_job: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_config(cfg: &XnatConfig) -> Result<Self> {
        Self::new(&cfg.base_url, cfg.timeouts)
    }

    /// Joins a root-relative resource path onto the base URL.
    ///
    /// Each `/`-separated segment is percent-encoded on its own, so a `?`, `#`
    /// or `%` in a file name stays part of that name.
    pub fn request_url(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn easy(&self, url: &Url) -> Result<Easy> {
        let mut easy = Easy::new();
        easy.url(url.as_str()).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(Duration::from_secs(self.timeouts.connect_secs))?;
        easy.timeout(Duration::from_secs(self.timeouts.transfer_secs))?;
        Ok(easy)
    }

    /// Performs a request whose response body is small enough to buffer.
    fn perform_buffered(easy: &mut Easy, what: &str) -> Result<(u32, Vec<u8>)> {
        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .with_context(|| format!("{} request failed", what))?;
        }
        let code = easy.response_code().context("no response code")?;
        Ok((code, body))
    }
}

fn ensure_success(method: &str, url: &Url, code: u32, body: &[u8]) -> Result<()> {
    if (200..300).contains(&code) {
        return Ok(());
    }
    let text = String::from_utf8_lossy(&body[..body.len().min(ERROR_BODY_LIMIT)]);
    anyhow::bail!("{} {} returned HTTP {}: {}", method, url, code, text.trim())
}

/// Path for the partial download: appends `.part` to the final path.
fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

impl Transport for CurlSession {
    fn upload(&self, local_path: &Path, request: &UploadRequest) -> Result<()> {
        let mut url = self.request_url(&request.uri)?;
        url.set_query(Some(&request.query_string()));
        let mut file =
            File::open(local_path).with_context(|| format!("open {}", local_path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("stat {}", local_path.display()))?
            .len();

        let mut easy = self.easy(&url)?;
        easy.upload(true)?; // PUT
        easy.in_filesize(size)?;
        let mut list = List::new();
        list.append("Expect:")?;
        list.append("Content-Type: application/octet-stream")?;
        easy.http_headers(list)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.read_function(|buf| {
                file.read(buf).map_err(|e| {
                    tracing::warn!("reading upload body failed: {}", e);
                    ReadError::Abort
                })
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform().context("PUT request failed")?;
        }

        let code = easy.response_code().context("no response code")?;
        ensure_success("PUT", &url, code, &body)?;
        tracing::debug!("PUT {} ({} bytes) -> HTTP {}", url, size, code);
        Ok(())
    }

    fn get(&self, uri: &str) -> Result<JobHandle> {
        let job = JobHandle(self.next_job.fetch_add(1, Ordering::Relaxed));
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(job, uri.to_string());
        Ok(job)
    }

    fn sync_fetch(&self, job: JobHandle) -> Result<Vec<CatalogRecord>> {
        let uri = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&job)
            .ok_or_else(|| anyhow::anyhow!("unknown catalog job {:?}", job))?;

        let mut url = self.request_url(&format!("{}/files", uri))?;
        url.set_query(Some("format=json"));
        let mut easy = self.easy(&url)?;
        let (code, body) = Self::perform_buffered(&mut easy, "catalog GET")?;
        ensure_success("GET", &url, code, &body)?;
        let records = catalog::parse_result_set(&body)
            .with_context(|| format!("parse catalog of {}", uri))?;
        tracing::debug!("catalog {} has {} records", uri, records.len());
        Ok(records)
    }

    fn download(&self, dest: &Path, uri: &str) -> Result<u64> {
        let url = self.request_url(uri)?;
        let part = temp_path(dest);
        let mut file = File::create(&part).with_context(|| format!("create {}", part.display()))?;
        let mut written = 0u64;

        let result = (|| -> Result<()> {
            let mut easy = self.easy(&url)?;
            easy.low_speed_limit(1024)?;
            easy.low_speed_time(Duration::from_secs(60))?;
            {
                let mut transfer = easy.transfer();
                transfer.write_function(|data| match file.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        tracing::warn!("download write failed: {}", e);
                        Ok(0) // abort transfer
                    }
                })?;
                transfer.perform().context("GET request failed")?;
            }
            let code = easy.response_code().context("no response code")?;
            if !(200..300).contains(&code) {
                anyhow::bail!("GET {} returned HTTP {}", url, code);
            }
            file.sync_all()
                .with_context(|| format!("sync {}", part.display()))?;
            Ok(())
        })();

        if let Err(e) = result {
            drop(file);
            let _ = fs::remove_file(&part);
            return Err(e);
        }
        drop(file);
        fs::rename(&part, dest)
            .with_context(|| format!("rename {} -> {}", part.display(), dest.display()))?;
        tracing::debug!("GET {} -> {} ({} bytes)", url, dest.display(), written);
        Ok(written)
    }

    fn delete(&self, uri: &str) -> Result<()> {
        let url = self.request_url(uri)?;
        let mut easy = self.easy(&url)?;
        easy.custom_request("DELETE")?;
        let (code, body) = Self::perform_buffered(&mut easy, "DELETE")?;
        ensure_success("DELETE", &url, code, &body)?;
        tracing::debug!("DELETE {} -> HTTP {}", url, code);
        Ok(())
    }

    fn exists(&self, uri: &str) -> Result<bool> {
        let url = self.request_url(uri)?;
        let mut easy = self.easy(&url)?;
        easy.nobody(true)?; // HEAD request
        let (code, _) = Self::perform_buffered(&mut easy, "HEAD")?;
        match code {
            200..=299 => Ok(true),
            404 => Ok(false),
            _ => anyhow::bail!("HEAD {} returned HTTP {}", url, code),
        }
    }
}
