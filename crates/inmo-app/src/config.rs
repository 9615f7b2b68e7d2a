//! Configuration: CLI flags and environment over an optional TOML file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use inmo_api::resolve_base_url;
use inmo_results::image::DEFAULT_MARGIN_PX;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::theme::Theme;

/// Contents of `~/.inmo/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub deploy_host: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub image_margin_px: Option<f64>,
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl FileConfig {
    /// Load config from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Like [`FileConfig::load_from_file`], but a missing file is an empty config
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Fully resolved settings of one run
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub image_margin: f64,
    pub theme_preference: Option<Theme>,
    pub theme_path: Option<PathBuf>,
    pub verbose: bool,
}

impl AppConfig {
    /// Merge CLI/env values over file values
    pub fn resolve(cli: &Cli, file: FileConfig, theme_path: Option<PathBuf>) -> Self {
        let api_url = cli.api_url.as_deref().or(file.api_url.as_deref());
        let deploy_host = cli.deploy_host.as_deref().or(file.deploy_host.as_deref());

        Self {
            base_url: resolve_base_url(api_url, deploy_host),
            timeout: cli
                .timeout
                .or(file.timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            image_margin: cli
                .image_margin
                .or(file.image_margin_px)
                .filter(|m| m.is_finite() && *m >= 0.0)
                .unwrap_or(DEFAULT_MARGIN_PX),
            theme_preference: cli.theme.or(file.theme),
            theme_path,
            verbose: cli.verbose,
        }
    }
}

/// Get or create the base inmo directory (~/.inmo)
pub fn get_inmo_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Failed to get home directory")?;

    let inmo_dir = PathBuf::from(home_dir).join(".inmo");

    if !inmo_dir.exists() {
        fs::create_dir_all(&inmo_dir).context("Failed to create inmo directory")?;
    }

    Ok(inmo_dir)
}

/// Set up application configuration from CLI
pub fn setup_from_cli(cli: &Cli) -> Result<AppConfig> {
    let inmo_dir = match get_inmo_dir() {
        Ok(dir) => Some(dir),
        Err(e) => {
            log::warn!("Settings directory unavailable, nothing will be saved: {:#}", e);
            None
        }
    };

    let file = match (&cli.config, &inmo_dir) {
        (Some(path), _) => FileConfig::load_from_file(path)?,
        (None, Some(dir)) => FileConfig::load_optional(dir.join("config.toml"))?,
        (None, None) => FileConfig::default(),
    };

    let config = AppConfig::resolve(cli, file, inmo_dir.map(|dir| dir.join("theme")));
    log::debug!("Resolved configuration: {:?}", config);
    Ok(config)
}
