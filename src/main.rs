use anyhow::{Context, Result};
use retailprep::{
    config::{Config, DEFAULT_CONFIG_PATH},
    ingest::DataIngestion,
    logging,
    process::DataPreprocessor,
};
use std::env;
use tokio::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path))?;

    // ─── 3) ingestion: download, unzip, sheets → interim CSVs ────────
    let stage = "Data Ingestion stage";
    info!(">>>>>> {} started <<<<<<", stage);
    let start = Instant::now();
    let ingestion = DataIngestion::new(&config.data_ingestion)?;
    match ingestion.run().await {
        Ok(csvs) => {
            info!(files = csvs.len(), elapsed = ?start.elapsed(), "interim CSVs written");
            info!(">>>>>> {} completed <<<<<<\n\nx==========x", stage);
        }
        Err(e) => {
            error!("{} failed: {:#}", stage, e);
            return Err(e.context(stage));
        }
    }

    // ─── 4) preprocessing: combine → clean → save ────────────────────
    let stage = "Data Preprocessor Stage";
    info!(">>>>>> {} started <<<<<<", stage);
    let start = Instant::now();
    let preprocessor = DataPreprocessor::new(&config.data_preprocessor);
    match preprocessor.run() {
        Ok(summary) => {
            info!(
                consolidated = summary.consolidated_rows,
                clean = summary.clean_rows,
                analysis = summary.analysis_rows,
                elapsed = ?start.elapsed(),
                "Data preprocessing completed successfully"
            );
            info!(">>>>>> {} completed <<<<<<\n\nx==========x", stage);
        }
        Err(e) => {
            error!("{} failed: {}", stage, e);
            return Err(anyhow::Error::new(e).context(stage));
        }
    }

    info!("all done");
    Ok(())
}
