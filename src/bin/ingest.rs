use anyhow::{Context, Result};
use retailprep::{
    config::{Config, DEFAULT_CONFIG_PATH},
    ingest::DataIngestion,
    logging,
};
use std::env;
use tracing::info;

/// Runs only the download + workbook split stage.
#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path))?;

    info!(">>>>>> Data Ingestion stage started <<<<<<");
    let csvs = DataIngestion::new(&config.data_ingestion)?.run().await?;
    for path in &csvs {
        info!("wrote {}", path.display());
    }
    info!(">>>>>> Data Ingestion stage completed <<<<<<");
    Ok(())
}
