use anyhow::Result;
use retailprep::{
    config::DataPreprocessorConfig,
    process::{self, clean::sales_amount, DataPreprocessor},
    PipelineError,
};
use std::{fs, path::Path};
use tempfile::tempdir;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const HEADER: &str = "Invoice,StockCode,Description,Quantity,InvoiceDate,Price,Customer ID,Country\n";

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,retailprep::process=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn write_interim(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(
        dir.join("year_2009_2010.csv"),
        format!(
            "{HEADER}\
             C12345,A1,Widget,2,2021-01-01 10:00:00,5.0,100,UK\n\
             12345,A1,Widget,3,2021-01-01 10:00:00,2.5,100,UK\n\
             12346,B2,Gadget,5,2021-01-02 11:30:00,0,101,France\n\
             12347,C3,Gizmo,1,2021-01-03 09:15:00,4.0,,UK\n"
        ),
    )?;
    fs::write(
        dir.join("year_2010_2011.csv"),
        format!(
            "{HEADER}\
             536365,85123A,\"WHITE HANGING HEART T-LIGHT HOLDER\",6,2010-12-01 08:26:00,2.55,17850.0,United Kingdom\n\
             536366,22633,HAND WARMER,-6,2010-12-01 08:28:00,1.85,17850,United Kingdom\n"
        ),
    )?;
    fs::write(dir.join("README.md"), "not a csv")?;
    Ok(())
}

fn config_in(root: &Path) -> DataPreprocessorConfig {
    DataPreprocessorConfig {
        interim_dir: root.join("interim"),
        processed_path: root.join("processed/clean_data.csv"),
        final_path: root.join("final/final_data.csv"),
    }
}

#[test]
fn test_full_preprocess_run() -> Result<()> {
    init_test_logging();
    let root = tempdir()?;
    let config = config_in(root.path());
    write_interim(&config.interim_dir)?;

    let summary = DataPreprocessor::new(&config).run()?;
    assert_eq!(summary.consolidated_rows, 6);
    assert_eq!(summary.clean_rows, 4);
    assert_eq!(summary.analysis_rows, 2);

    let clean = fs::read_to_string(&config.processed_path)?;
    assert_eq!(
        clean,
        "invoice_no,stock_code,customer_id,invoice_date,invoice_time,description,country,quantity,price\n\
         12345,A1,100,2021-01-01,10:00:00,Widget,UK,3,2.5\n\
         12346,B2,101,2021-01-02,11:30:00,Gadget,France,5,0.0\n\
         536365,85123A,17850,2010-12-01,08:26:00,WHITE HANGING HEART T-LIGHT HOLDER,United Kingdom,6,2.55\n\
         536366,22633,17850,2010-12-01,08:28:00,HAND WARMER,United Kingdom,-6,1.85\n"
    );

    let analysis = fs::read_to_string(&config.final_path)?;
    assert_eq!(
        analysis,
        "invoice_no,customer_id,invoice_date,country,quantity,sales_amount\n\
         12345,100,2021-01-01,UK,3,7.5\n\
         536365,17850,2010-12-01,United Kingdom,6,15.3\n"
    );
    Ok(())
}

#[test]
fn test_rerun_is_byte_identical() -> Result<()> {
    let root = tempdir()?;
    let config = config_in(root.path());
    write_interim(&config.interim_dir)?;

    DataPreprocessor::new(&config).run()?;
    let first = (
        fs::read(&config.processed_path)?,
        fs::read(&config.final_path)?,
    );
    DataPreprocessor::new(&config).run()?;
    let second = (
        fs::read(&config.processed_path)?,
        fs::read(&config.final_path)?,
    );
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_output_invariants_hold() -> Result<()> {
    let root = tempdir()?;
    let config = config_in(root.path());
    write_interim(&config.interim_dir)?;

    let dataset = process::combine(&config.interim_dir)?;
    let (clean, analysis) = process::clean(&dataset)?;
    let (clean_again, analysis_again) = process::clean(&dataset)?;
    assert_eq!(clean, clean_again);
    assert_eq!(analysis, analysis_again);

    assert!(clean
        .iter()
        .all(|r| !r.invoice_no.to_string().starts_with('C')));
    assert!(analysis
        .iter()
        .all(|r| r.sales_amount > rust_decimal::Decimal::ZERO));

    for a in &analysis {
        let c = clean
            .iter()
            .find(|c| c.invoice_no == a.invoice_no && c.customer_id == a.customer_id)
            .expect("analysis row has a clean counterpart");
        assert_eq!(Some(a.sales_amount), sales_amount(c.price, c.quantity));
        assert_eq!(a.invoice_date, c.invoice_date);
        assert_eq!(a.country, c.country);
    }
    Ok(())
}

#[test]
fn test_bad_invoice_writes_nothing() -> Result<()> {
    let root = tempdir()?;
    let config = config_in(root.path());
    fs::create_dir_all(&config.interim_dir)?;
    fs::write(
        config.interim_dir.join("sheet.csv"),
        format!("{HEADER}A506401,B,Adjust,1,2011-04-14 13:00:00,-53594.36,17399,United Kingdom\n"),
    )?;

    let err = DataPreprocessor::new(&config).run().unwrap_err();
    assert!(matches!(err, PipelineError::Transform { .. }), "{err}");
    assert!(!config.processed_path.exists());
    assert!(!config.final_path.exists());
    Ok(())
}

#[test]
fn test_schema_mismatch_aborts_run() -> Result<()> {
    let root = tempdir()?;
    let config = config_in(root.path());
    write_interim(&config.interim_dir)?;
    fs::write(
        config.interim_dir.join("zzz_other.csv"),
        "Invoice,StockCode,Description,Quantity,InvoiceDate,Price,CustomerID,Country\n",
    )?;

    let err = DataPreprocessor::new(&config).run().unwrap_err();
    assert!(matches!(err, PipelineError::Schema { .. }), "{err}");
    assert!(!config.processed_path.exists());
    Ok(())
}

#[test]
fn test_overflowing_amount_fails_without_panic() -> Result<()> {
    let root = tempdir()?;
    let config = config_in(root.path());
    fs::create_dir_all(&config.interim_dir)?;
    fs::write(
        config.interim_dir.join("sheet.csv"),
        format!("{HEADER}536365,A1,Widget,10000000000,2010-12-01 08:26:00,100000000000000000000,17850,United Kingdom\n"),
    )?;

    let err = DataPreprocessor::new(&config).run().unwrap_err();
    assert!(matches!(err, PipelineError::Transform { row: 0, .. }), "{err}");
    assert!(!config.processed_path.exists());
    assert!(!config.final_path.exists());
    Ok(())
}
