use anyhow::{Context, Result};
use retailprep::{
    config::{Config, DEFAULT_CONFIG_PATH},
    logging,
    process::DataPreprocessor,
};
use std::env;
use tracing::info;

/// Runs only the combine → clean → save stage over existing interim CSVs.
fn main() -> Result<()> {
    logging::init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path))?;

    info!(">>>>>> Data Preprocessor Stage started <<<<<<");
    let summary = DataPreprocessor::new(&config.data_preprocessor)
        .run()
        .context("Data Preprocessor Stage")?;
    info!(
        consolidated = summary.consolidated_rows,
        clean = summary.clean_rows,
        analysis = summary.analysis_rows,
        "Data preprocessing completed successfully"
    );
    info!(">>>>>> Data Preprocessor Stage completed <<<<<<");
    Ok(())
}
