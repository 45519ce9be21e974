use anyhow::Result;
use clap::Parser;

use vevote_optimizer::app::{self, AppCfg};
use vevote_optimizer::application::Cli;
use vevote_optimizer::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    // Priority: CLI args > Config file > Defaults
    let base_config = match &cli.global.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let app_cfg = AppCfg::from_config(base_config)?.with_cli_args(&cli.global);

    app::run(app_cfg, cli.command).await
}
