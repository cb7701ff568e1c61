pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod logging;
pub mod process;

pub use config::Config;
pub use error::{PipelineError, PipelineResult};
