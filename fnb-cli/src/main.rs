//! FNB CLI - forecast food & beverage sales for the park's outlets.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "fnb-cli",
    version,
    about = "Weather-aware food & beverage sales forecasting"
)]
struct Cli {
    #[command(subcommand)]
    command: fnb_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("fnb-cli {}", env!("CARGO_PKG_VERSION"));
    fnb_cmd::run(cli.command).await
}
