// src/process/mod.rs
pub mod clean;
pub mod combine;
pub mod date_parser;
pub mod records;
pub mod save;
pub mod utils;

use std::path::PathBuf;
use tracing::{info, instrument};

use crate::config::DataPreprocessorConfig;
use crate::error::PipelineResult;

pub use clean::clean;
pub use combine::combine;
pub use records::{AnalysisRecord, CleanRecord, Dataset, RawRecord};
pub use save::save;

/// Row counts at each step of one preprocessing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessSummary {
    pub consolidated_rows: usize,
    pub clean_rows: usize,
    pub analysis_rows: usize,
}

/// Consolidates the interim CSVs and writes the clean and analysis datasets.
pub struct DataPreprocessor {
    interim_dir: PathBuf,
    processed_path: PathBuf,
    final_path: PathBuf,
}

impl DataPreprocessor {
    pub fn new(config: &DataPreprocessorConfig) -> Self {
        Self {
            interim_dir: config.interim_dir.clone(),
            processed_path: config.processed_path.clone(),
            final_path: config.final_path.clone(),
        }
    }

    /// combine → clean → save. Nothing is written unless the first two succeed.
    #[instrument(level = "info", skip(self), fields(interim = %self.interim_dir.display()))]
    pub fn run(&self) -> PipelineResult<PreprocessSummary> {
        let dataset = combine(&self.interim_dir)?;

        info!("Preprocessing the consolidated dataset");
        let (clean_rows, analysis_rows) = clean(&dataset)?;

        info!("Saving the clean and transformed datasets as CSV files");
        save(
            &clean_rows,
            &analysis_rows,
            &self.processed_path,
            &self.final_path,
        )?;

        Ok(PreprocessSummary {
            consolidated_rows: dataset.len(),
            clean_rows: clean_rows.len(),
            analysis_rows: analysis_rows.len(),
        })
    }
}
