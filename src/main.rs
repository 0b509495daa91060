use anyhow::Result;
use clap::Parser;

use brand_portrait::{cli::CliOptions, config::AppConfig, config::setup_logging, web_pages};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = CliOptions::parse();

    if let Err(err) = setup_logging(cli.debug) {
        eprintln!("Continuing without logging: {err}");
    }

    let config = AppConfig::from_cli(&cli)?;
    config.prepare_dirs().await?;

    web_pages::setup_server(&cli.listen_address, cli.port, config).await
}
