//! Download command: fetch one file from a resource.

use anyhow::Result;
use std::path::Path;
use xnat_core::{CurlSession, FileResource, RemoteResource, VerifiedUploader};

pub async fn run_download(session: CurlSession, parent: &str, name: &str, dest: &Path) -> Result<()> {
    let mut resource = FileResource::new(parent);
    resource.set_name(name);
    let uri = resource.uri();
    let dest = dest.to_path_buf();

    let written = {
        let dest = dest.clone();
        tokio::task::spawn_blocking(move || VerifiedUploader::new(&session).download(&resource, &dest))
            .await??
    };
    println!("downloaded {} -> {} ({} bytes)", uri, dest.display(), written);
    Ok(())
}
