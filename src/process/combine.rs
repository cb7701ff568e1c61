use csv::{ReaderBuilder, StringRecord};
use glob::glob;
use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use crate::error::{PipelineError, PipelineResult};
use crate::process::{
    date_parser::parse_invoice_datetime,
    records::{
        Dataset, RawRecord, COL_COUNTRY, COL_CUSTOMER_ID, COL_DESCRIPTION, COL_INVOICE,
        COL_INVOICE_DATE, COL_PRICE, COL_QUANTITY, COL_STOCK_CODE, REQUIRED_COLUMNS,
    },
    utils::{non_null, parse_decimal, parse_integral},
};

/// Positions of each column within one file's header.
struct ColumnIndex {
    invoice: usize,
    stock_code: usize,
    description: usize,
    quantity: usize,
    invoice_date: usize,
    price: usize,
    customer_id: usize,
    country: usize,
    extra: Vec<usize>,
}

impl ColumnIndex {
    fn from_header(
        path: &Path,
        header: &StringRecord,
        extra_columns: &[String],
    ) -> PipelineResult<Self> {
        let positions: HashMap<&str, usize> =
            header.iter().enumerate().map(|(i, h)| (h, i)).collect();
        let find = |name: &str| {
            positions
                .get(name)
                .copied()
                .ok_or_else(|| PipelineError::Schema {
                    path: path.to_path_buf(),
                    message: format!("missing required column {:?}", name),
                })
        };

        Ok(Self {
            invoice: find(COL_INVOICE)?,
            stock_code: find(COL_STOCK_CODE)?,
            description: find(COL_DESCRIPTION)?,
            quantity: find(COL_QUANTITY)?,
            invoice_date: find(COL_INVOICE_DATE)?,
            price: find(COL_PRICE)?,
            customer_id: find(COL_CUSTOMER_ID)?,
            country: find(COL_COUNTRY)?,
            extra: extra_columns
                .iter()
                .map(|c| find(c.as_str()))
                .collect::<PipelineResult<_>>()?,
        })
    }
}

/// List the `*.csv` files directly under `dir`, sorted by path.
pub fn list_csv_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PipelineError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "interim directory not found"),
        ));
    }
    let pattern = dir.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let entries = glob(&pattern).map_err(|e| PipelineError::Schema {
        path: dir.to_path_buf(),
        message: format!("bad glob pattern {}: {}", pattern, e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            PipelineError::io(path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every interim CSV under `interim_dir` and union the rows into one dataset.
///
/// All files must share the same set of column names, and that set must
/// contain the eight required columns. Rows keep file order then row order.
#[instrument(level = "info", skip(interim_dir), fields(dir = %interim_dir.as_ref().display()))]
pub fn combine(interim_dir: impl AsRef<Path>) -> PipelineResult<Dataset> {
    let interim_dir = interim_dir.as_ref();
    let files = list_csv_files(interim_dir)?;
    if files.is_empty() {
        return Err(PipelineError::Schema {
            path: interim_dir.to_path_buf(),
            message: "no CSV files to combine".to_string(),
        });
    }

    info!("Reading {} individual CSV files", files.len());
    let mut dataset = Dataset::default();
    let mut expected: Option<BTreeSet<String>> = None;

    for path in &files {
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);
        let header = rdr
            .headers()
            .map_err(|e| PipelineError::csv(path, e))?
            .clone();
        let names: BTreeSet<String> = header.iter().map(str::to_string).collect();
        if names.len() != header.len() {
            return Err(PipelineError::Schema {
                path: path.clone(),
                message: format!("duplicate column names in header {:?}", header),
            });
        }

        match &expected {
            None => {
                dataset.extra_columns = header
                    .iter()
                    .filter(|c| !REQUIRED_COLUMNS.contains(c))
                    .map(str::to_string)
                    .collect();
                expected = Some(names);
            }
            Some(first) if *first != names => {
                let missing: Vec<_> = first.difference(&names).collect();
                let unexpected: Vec<_> = names.difference(first).collect();
                return Err(PipelineError::Schema {
                    path: path.clone(),
                    message: format!(
                        "columns differ from {:?}: missing {:?}, unexpected {:?}",
                        files[0], missing, unexpected
                    ),
                });
            }
            Some(_) => {}
        }

        let index = ColumnIndex::from_header(path, &header, &dataset.extra_columns)?;
        let before = dataset.records.len();
        for result in rdr.records() {
            let record = result.map_err(|e| PipelineError::csv(path, e))?;
            dataset.records.push(parse_row(path, &record, &index)?);
        }
        debug!(
            file = %path.display(),
            rows = dataset.records.len() - before,
            "read interim CSV"
        );
    }

    info!(
        rows = dataset.records.len(),
        "Combined all CSV files into a consolidated dataset"
    );
    Ok(dataset)
}

fn parse_row(path: &Path, record: &StringRecord, index: &ColumnIndex) -> PipelineResult<RawRecord> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let field = |i: usize| record.get(i).and_then(non_null);
    let text = |i: usize| field(i).map(str::to_string);
    let parse_err = |column: &str, value: &str, message: &str| PipelineError::Parse {
        path: path.to_path_buf(),
        line,
        column: column.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    };

    let quantity = field(index.quantity)
        .map(|v| parse_integral(v).ok_or_else(|| parse_err(COL_QUANTITY, v, "not an integer")))
        .transpose()?;
    let price = field(index.price)
        .map(|v| parse_decimal(v).ok_or_else(|| parse_err(COL_PRICE, v, "not a number")))
        .transpose()?;
    let invoice_date = field(index.invoice_date)
        .map(|v| {
            parse_invoice_datetime(v)
                .ok_or_else(|| parse_err(COL_INVOICE_DATE, v, "not a date-time"))
        })
        .transpose()?;

    Ok(RawRecord {
        invoice: text(index.invoice),
        stock_code: text(index.stock_code),
        description: text(index.description),
        quantity,
        invoice_date,
        price,
        customer_id: text(index.customer_id),
        country: text(index.country),
        extra: index.extra.iter().map(|&i| text(i)).collect(),
    })
}
