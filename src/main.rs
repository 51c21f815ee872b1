use clap::Parser;

use twitter_downloader_lib::cli::{self, Cli};
use twitter_downloader_lib::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);
    cli::run(cli).await
}
