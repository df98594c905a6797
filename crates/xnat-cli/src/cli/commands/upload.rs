//! Upload command: verified upload of one local file.

use crate::cli::UploadArgs;
use anyhow::{Context, Result};
use xnat_core::config::XnatConfig;
use xnat_core::resource::{FILE_CONTENT, FILE_FORMAT, FILE_NAME, FILE_TAGS};
use xnat_core::{CurlSession, FileResource, RemoteResource, Transport, UploadOutcome, VerifiedUploader};

/// `--meta` keys that have a dedicated option.
const RESERVED_META: [(&str, &str); 4] = [
    (FILE_NAME, "--name"),
    (FILE_FORMAT, "--format"),
    (FILE_CONTENT, "--content"),
    (FILE_TAGS, "--tags"),
];

/// Builds the file resource described by the command-line arguments.
pub(crate) fn resource_from_args(cfg: &XnatConfig, args: &UploadArgs) -> Result<FileResource> {
    if let Some((key, option)) = args
        .meta
        .iter()
        .find_map(|(k, _)| RESERVED_META.iter().find(|(r, _)| *r == k.as_str()))
    {
        anyhow::bail!("--meta {} is reserved; use {} instead", key, option);
    }
    let name = match &args.name {
        Some(n) => n.clone(),
        None => args
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("cannot derive a file name from {}", args.path.display()))?,
    };
    let schema_type = args.schema_type.as_deref().unwrap_or(&cfg.schema_type);

    let mut resource = FileResource::with_schema_type(args.parent.as_str(), schema_type);
    resource.set_name(name);
    for (key, value) in &args.meta {
        resource.set_property(key.as_str(), value.as_str());
    }
    if let Some(format) = &args.format {
        resource.set_file_format(format.as_str());
    }
    if let Some(content) = &args.content {
        resource.set_file_content(content.as_str());
    }
    if let Some(tags) = &args.tags {
        resource.set_file_tags(tags.as_str());
    }
    resource.set_local_file_path(&args.path);
    resource.set_exists_remotely(args.overwrite);
    Ok(resource)
}

pub async fn run_upload(session: CurlSession, cfg: &XnatConfig, args: UploadArgs) -> Result<()> {
    let mut resource = resource_from_args(cfg, &args)?;
    let uri = resource.uri();

    let outcome = tokio::task::spawn_blocking(move || -> Result<UploadOutcome> {
        // Ask the archive only when the file is present locally, so a missing file fails without network traffic.
        if !resource.exists_remotely() && resource.local_file_path().exists() {
            let exists = session.exists(&resource.uri())?;
            resource.set_exists_remotely(exists);
        }
        Ok(VerifiedUploader::new(&session).upload(&mut resource)?)
    })
    .await??;

    match outcome {
        UploadOutcome::Verified { md5 } => println!("uploaded {} (md5 {} verified)", uri, md5),
        UploadOutcome::Unverified => {
            println!("uploaded {} (not verified: archive reported no checksum)", uri)
        }
    }
    Ok(())
}
