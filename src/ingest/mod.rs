// src/ingest/mod.rs
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use csv::WriterBuilder;
use regex::Regex;
use reqwest::Client;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing::{info, instrument};
use zip::ZipArchive;

use crate::config::DataIngestionConfig;
use crate::fetch::{self, zips};

/// Downloads the source archive and splits its workbook into one CSV per sheet.
pub struct DataIngestion {
    config: DataIngestionConfig,
    client: Client,
}

impl DataIngestion {
    pub fn new(config: &DataIngestionConfig) -> Result<Self> {
        let client = fetch::build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// Fetch the archive unless it is already on disk and no refresh was asked for.
    #[instrument(level = "info", skip(self), fields(url = %self.config.data_url))]
    pub async fn download_data(&self) -> Result<()> {
        let dest = &self.config.external_path;
        if !zips::needs_download(dest, self.config.download_status) {
            info!("The {} already exists. Skipping download", dest.display());
            return Ok(());
        }
        info!("File download started");
        zips::download_zip(&self.client, &self.config.data_url, dest).await?;
        Ok(())
    }

    /// Unzip the archive into `raw_dir` and write every sheet of its workbook to `interim_dir`.
    #[instrument(level = "info", skip(self))]
    pub fn save_dataset(&self) -> Result<Vec<PathBuf>> {
        for dir in [&self.config.raw_dir, &self.config.interim_dir] {
            fs::create_dir_all(dir).with_context(|| format!("creating directory {:?}", dir))?;
            info!("created directory at: {}", dir.display());
        }

        info!("Unzipping the downloaded file");
        let unzipped = unzip_file(&self.config.external_path, &self.config.raw_dir)?;
        let excel_file = unzipped
            .iter()
            .find(|name| name.ends_with(".xlsx"))
            .ok_or_else(|| {
                anyhow!(
                    "no .xlsx file inside {}",
                    self.config.external_path.display()
                )
            })?;
        info!("File unzipped. Excel file saved at: {}", excel_file);

        workbook_to_csvs(self.config.raw_dir.join(excel_file), &self.config.interim_dir)
    }

    pub async fn run(&self) -> Result<Vec<PathBuf>> {
        self.download_data().await?;
        self.save_dataset()
    }
}

/// Extract every entry of `zip_path` into `unzip_dir`, returning the entry names.
pub fn unzip_file(zip_path: impl AsRef<Path>, unzip_dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let zip_path = zip_path.as_ref();
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    archive
        .extract(unzip_dir.as_ref())
        .with_context(|| format!("Failed to extract {:?}", zip_path))?;
    Ok(names)
}

/// `"Year 2009-2010"` → `"year_2009_2010.csv"`.
pub fn sheet_csv_name(sheet: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let re = SEPARATORS.get_or_init(|| Regex::new(r"[\s-]").expect("separator regex is valid"));
    format!("{}.csv", re.replace_all(&sheet.to_lowercase(), "_"))
}

/// Render one spreadsheet cell as a CSV field.
pub fn cell_to_field(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::Error(e) => e.to_string(),
    }
}

/// Write each sheet of the workbook at `workbook_path` to `<interim_dir>/<sheet>.csv`.
#[instrument(level = "info", skip_all, fields(workbook = %workbook_path.as_ref().display()))]
pub fn workbook_to_csvs(
    workbook_path: impl AsRef<Path>,
    interim_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let workbook_path = workbook_path.as_ref();
    let interim_dir = interim_dir.as_ref();

    info!("Loading the excel file");
    let mut workbook = open_workbook_auto(workbook_path)
        .with_context(|| format!("opening workbook {:?}", workbook_path))?;
    info!("Excel file loaded successfully.");

    let mut written = Vec::new();
    for sheet in workbook.sheet_names() {
        info!("Writing {} sheet into CSV file", sheet);
        let range = workbook
            .worksheet_range(&sheet)
            .with_context(|| format!("reading sheet {:?}", sheet))?;

        let csv_path = interim_dir.join(sheet_csv_name(&sheet));
        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .from_path(&csv_path)
            .with_context(|| format!("creating {:?}", csv_path))?;
        for row in range.rows() {
            wtr.write_record(row.iter().map(cell_to_field))?;
        }
        wtr.flush()?;

        info!("{} Sheet data written successfully", sheet);
        info!("CSV file saved at: {}", csv_path.display());
        written.push(csv_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, content) in entries {
                zip.start_file(*name, options.clone())?;
                zip.write_all(content.as_bytes())?;
            }
            zip.finish()?;
        }
        fs::write(path, buf)?;
        Ok(())
    }

    fn config_for(root: &Path) -> DataIngestionConfig {
        DataIngestionConfig {
            data_url: "http://127.0.0.1:9/online_retail_ii.zip".to_string(),
            user_agent: "retailprep-test".to_string(),
            timeout: 1,
            download_status: false,
            external_path: root.join("external/online_retail_ii.zip"),
            raw_dir: root.join("raw"),
            interim_dir: root.join("interim"),
        }
    }

    #[test]
    fn test_sheet_csv_name() {
        assert_eq!(sheet_csv_name("Year 2009-2010"), "year_2009_2010.csv");
        assert_eq!(sheet_csv_name("Sheet1"), "sheet1.csv");
        assert_eq!(sheet_csv_name("A\tB-C D"), "a_b_c_d.csv");
    }

    #[test]
    fn test_cell_to_field() {
        assert_eq!(cell_to_field(&Data::Empty), "");
        assert_eq!(cell_to_field(&Data::Int(489434)), "489434");
        assert_eq!(cell_to_field(&Data::Float(6.95)), "6.95");
        assert_eq!(cell_to_field(&Data::Float(13085.0)), "13085");
        assert_eq!(cell_to_field(&Data::String("C489449".into())), "C489449");
        assert_eq!(cell_to_field(&Data::Bool(true)), "True");
    }

    #[test]
    fn test_unzip_file_extracts_entries() -> Result<()> {
        let dir = tempdir()?;
        let zip_path = dir.path().join("data.zip");
        write_zip(&zip_path, &[("online_retail_II.xlsx", "not really"), ("README.txt", "hi")])?;

        let out = dir.path().join("raw");
        let names = unzip_file(&zip_path, &out)?;
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"online_retail_II.xlsx".to_string()));
        assert_eq!(fs::read_to_string(out.join("README.txt"))?, "hi");
        Ok(())
    }

    #[test]
    fn test_save_dataset_without_workbook_fails() -> Result<()> {
        let dir = tempdir()?;
        let config = config_for(dir.path());
        fs::create_dir_all(config.external_path.parent().unwrap())?;
        write_zip(&config.external_path, &[("data.csv", "a,b\n1,2\n")])?;

        let ingestion = DataIngestion::new(&config)?;
        let err = ingestion.save_dataset().unwrap_err();
        assert!(err.to_string().contains("no .xlsx"), "{err}");
        assert!(config.interim_dir.is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_archive_skips_download() -> Result<()> {
        let dir = tempdir()?;
        let config = config_for(dir.path());
        fs::create_dir_all(config.external_path.parent().unwrap())?;
        fs::write(&config.external_path, b"cached")?;

        // The URL points at a closed port; reaching the network would fail.
        DataIngestion::new(&config)?.download_data().await?;
        assert_eq!(fs::read(&config.external_path)?, b"cached");
        Ok(())
    }
}
