// src/config/mod.rs
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

/// Default location of the pipeline configuration, relative to the working dir.
pub const DEFAULT_CONFIG_PATH: &str = "conf/configs.yaml";

/// Top-level layout of `configs.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data_ingestion: DataIngestionConfig,
    pub data_preprocessor: DataPreprocessorConfig,
}

/// Settings for downloading and unpacking the source workbook.
#[derive(Debug, Clone, Deserialize)]
pub struct DataIngestionConfig {
    pub data_url: String,
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Force a fresh download even if the archive is already on disk.
    #[serde(default)]
    pub download_status: bool,
    pub external_path: PathBuf,
    pub raw_dir: PathBuf,
    pub interim_dir: PathBuf,
}

/// Settings for the consolidate → clean → save stage.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPreprocessorConfig {
    pub interim_dir: PathBuf,
    pub processed_path: PathBuf,
    pub final_path: PathBuf,
}

impl Config {
    /// Read and parse the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            message: format!("cannot read file: {e}"),
        })?;
        let config = Self::from_yaml_str(&content).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        info!("yaml file: {} loaded successfully", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}
