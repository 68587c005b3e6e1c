// src/main.rs

use assetwatch::{cli, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    assetwatch::run(args).await?;
    Ok(())
}
