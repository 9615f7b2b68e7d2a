//! The `inmo` terminal client
//!
//! Wires the session controller and the result views to a terminal: command
//! line and file configuration, the process-wide theme, a character-grid map
//! engine, an HTTP image fetcher and the interactive REPL.

pub mod cli;
pub mod config;
pub mod fetcher;
pub mod render;
pub mod repl;
pub mod terminal_map;
pub mod theme;

pub use cli::Cli;
pub use config::{setup_from_cli, AppConfig, FileConfig};
pub use fetcher::HttpImageFetcher;
pub use repl::run_repl_mode;
pub use terminal_map::{MapCanvas, TextEngineLoader};
pub use theme::{Theme, ThemeStore};
