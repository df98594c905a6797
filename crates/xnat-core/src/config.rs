use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::resource::DEFAULT_SCHEMA_TYPE;

/// Curl timeouts applied to every archive request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_secs: u64,
    /// Seconds allowed for a whole request, including the body transfer.
    pub transfer_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            transfer_secs: 3600,
        }
    }
}

/// Global configuration loaded from `~/.config/xnat-file/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XnatConfig {
    /// Archive root, e.g. `https://central.xnat.org`. Request URIs are appended to its path.
    pub base_url: String,
    /// `xsi:type` sent with uploads unless overridden per command.
    #[serde(default = "default_schema_type")]
    pub schema_type: String,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

fn default_schema_type() -> String {
    DEFAULT_SCHEMA_TYPE.to_string()
}

impl Default for XnatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            schema_type: default_schema_type(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("xnat-file")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<XnatConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = XnatConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_from(path: &Path) -> Result<XnatConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: XnatConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
