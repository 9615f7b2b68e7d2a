use std::path::PathBuf;

use clap::Parser;

use crate::theme::Theme;

/// CLI arguments for inmo
#[derive(Parser, Debug, Default)]
#[command(name = "inmo")]
#[command(about = "INMO - asistente inmobiliario conversacional en la terminal")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Backend base URL (e.g., http://localhost:8000)
    #[arg(long, value_name = "URL", env = "INMO_API_URL")]
    pub api_url: Option<String>,

    /// Host the client is served from; a hosted preview host selects the
    /// hosted backend
    #[arg(long, value_name = "HOST", env = "INMO_DEPLOY_HOST")]
    pub deploy_host: Option<String>,

    /// Path to the TOML config file (default: ~/.inmo/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Give up on a chat request after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Distance in pixels ahead of the viewport at which images start loading
    #[arg(long, value_name = "PX")]
    pub image_margin: Option<f64>,

    /// Color theme preference when none has been saved yet
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Enable verbose debug output (shows HTTP requests, map and image events)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Default filter for env_logger; `RUST_LOG` still wins
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
