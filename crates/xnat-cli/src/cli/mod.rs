//! CLI for verified XNAT file transfers.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use xnat_core::config::{self, XnatConfig};
use xnat_core::CurlSession;

use commands::{run_catalog, run_checksum, run_download, run_upload};

/// Top-level CLI for xnat-file.
#[derive(Debug, Parser)]
#[command(name = "xnat-file")]
#[command(about = "Upload files to an XNAT archive with checksum verification, and download them", long_about = None)]
pub struct Cli {
    /// Archive base URL; overrides `base_url` from the config file.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload a local file into a resource and verify it against the resource catalog.
    Upload(UploadArgs),

    /// Download a file from a resource.
    Download {
        /// URI of the containing resource (e.g. /data/projects/P/resources/R).
        #[arg(long)]
        parent: String,
        /// File name inside the resource.
        #[arg(long)]
        name: String,
        /// Local destination path.
        dest: PathBuf,
    },

    /// Compute MD5 and SHA-256 of a local file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// List the file catalog of a resource.
    Catalog {
        /// URI of the resource.
        #[arg(long)]
        parent: String,
    },
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Local file to upload.
    pub path: PathBuf,

    /// URI of the containing resource (e.g. /data/projects/P/resources/R).
    #[arg(long)]
    pub parent: String,

    /// Remote file name; defaults to the local file name.
    #[arg(long)]
    pub name: Option<String>,

    /// File format (e.g. DICOM, NIFTI).
    #[arg(long)]
    pub format: Option<String>,

    /// Content description.
    #[arg(long)]
    pub content: Option<String>,

    /// Free-text tags.
    #[arg(long)]
    pub tags: Option<String>,

    /// Extra metadata sent with the upload, in the order given. Repeatable.
    /// `Name`, `file_format`, `file_content` and `file_tags` are rejected; use the dedicated options.
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub meta: Vec<(String, String)>,

    /// Schema type sent as xsi:type; defaults to the configured one.
    #[arg(long, value_name = "TYPE")]
    pub schema_type: Option<String>,

    /// Overwrite without probing whether the file already exists.
    #[arg(long)]
    pub overwrite: bool,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

fn session(cfg: &XnatConfig) -> Result<CurlSession> {
    CurlSession::from_config(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(url) = cli.base_url {
            cfg.base_url = url;
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload(args) => run_upload(session(&cfg)?, &cfg, args).await?,
            CliCommand::Download { parent, name, dest } => {
                run_download(session(&cfg)?, &parent, &name, &dest).await?
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Catalog { parent } => run_catalog(session(&cfg)?, &parent).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
