use csv::WriterBuilder;
use serde::Serialize;
use std::{fs, path::Path};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::error::{PipelineError, PipelineResult};
use crate::process::records::{AnalysisRecord, CleanRecord, ANALYSIS_COLUMNS, CLEAN_COLUMNS};

/// Create `dir` and its parents if missing.
pub fn create_directories<P: AsRef<Path>>(dirs: &[P]) -> PipelineResult<()> {
    for dir in dirs {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        info!("created directory at: {}", dir.display());
    }
    Ok(())
}

/// Directory a file will be written into; `"."` for a bare file name.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Write both datasets as CSV, header first, no index column.
#[instrument(level = "info", skip_all, fields(clean = %clean_path.as_ref().display(), analysis = %analysis_path.as_ref().display()))]
pub fn save(
    clean: &[CleanRecord],
    analysis: &[AnalysisRecord],
    clean_path: impl AsRef<Path>,
    analysis_path: impl AsRef<Path>,
) -> PipelineResult<()> {
    let clean_path = clean_path.as_ref();
    let analysis_path = analysis_path.as_ref();
    create_directories(&[parent_dir(clean_path), parent_dir(analysis_path)])?;

    write_csv(clean_path, &CLEAN_COLUMNS, clean)?;
    write_csv(analysis_path, &ANALYSIS_COLUMNS, analysis)?;
    info!(
        clean_rows = clean.len(),
        analysis_rows = analysis.len(),
        "saved clean and analysis datasets"
    );
    Ok(())
}

/// Serialize `rows` into a temp file beside `path`, then rename it into place.
pub fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> PipelineResult<()> {
    let tmp = NamedTempFile::new_in(parent_dir(path)).map_err(|e| PipelineError::io(path, e))?;
    {
        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file());
        wtr.write_record(header)
            .map_err(|e| PipelineError::csv(path, e))?;
        for row in rows {
            wtr.serialize(row).map_err(|e| PipelineError::csv(path, e))?;
        }
        wtr.flush().map_err(|e| PipelineError::io(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}
