// Application configuration stored as TOML under the platform config dir

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::downloader::merge::DEFAULT_MERGE_TIMEOUT_SECS;
use crate::downloader::backends::ytdlp::DEFAULT_METADATA_TIMEOUT_SECS;
use crate::downloader::{MergeStrategy, NetworkConfig, Resolution};

pub const APP_DIR: &str = "tube-grabber";

/// Optional explicit paths to the helper binaries (`[tools]` section).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ytdlp_path: Option<String>,
    pub ffmpeg_path: Option<String>,
}

/// Global configuration loaded from `<config dir>/tube-grabber/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Resolution used when none is given on the command line.
    pub default_resolution: Resolution,
    /// Destination directory used when none is given on the command line.
    pub download_dir: PathBuf,
    /// How top-tier video and audio tracks are combined.
    pub merge_strategy: MergeStrategy,
    /// Wall-clock limit for the metadata lookup subprocess.
    pub metadata_timeout_seconds: u64,
    /// Wall-clock limit for one ffmpeg merge.
    pub merge_timeout_seconds: u64,
    pub network: NetworkConfig,
    pub tools: ToolPaths,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_resolution: Resolution::default(),
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            merge_strategy: MergeStrategy::default(),
            metadata_timeout_seconds: DEFAULT_METADATA_TIMEOUT_SECS,
            merge_timeout_seconds: DEFAULT_MERGE_TIMEOUT_SECS,
            network: NetworkConfig::default(),
            tools: ToolPaths::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("no configuration directory on this platform")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AppConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: AppConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}
