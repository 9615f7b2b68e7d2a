use anyhow::Result;
use clap::Parser;

use inmo::{run_repl_mode, setup_from_cli, theme, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp(None)
        .init();

    let config = setup_from_cli(&cli)?;
    let theme = theme::init_global(config.theme_path.clone(), config.theme_preference);

    run_repl_mode(config, theme).await
}
