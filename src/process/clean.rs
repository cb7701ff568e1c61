use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, instrument};

use crate::error::{PipelineError, PipelineResult};
use crate::process::{
    records::{AnalysisRecord, CleanRecord, Dataset, RawRecord},
    utils::parse_decimal,
};

/// Leading character of a cancelled invoice.
pub const CANCELLATION_MARKER: char = 'C';

/// A raw row with every cell present.
struct CompleteRow<'a> {
    invoice: &'a str,
    stock_code: &'a str,
    description: &'a str,
    quantity: i64,
    invoice_date: chrono::NaiveDateTime,
    price: Decimal,
    customer_id: &'a str,
    country: &'a str,
}

impl<'a> CompleteRow<'a> {
    fn from_raw(r: &'a RawRecord) -> Option<Self> {
        if r.extra.iter().any(Option::is_none) {
            return None;
        }
        Some(Self {
            invoice: r.invoice.as_deref()?,
            stock_code: r.stock_code.as_deref()?,
            description: r.description.as_deref()?,
            quantity: r.quantity?,
            invoice_date: r.invoice_date?,
            price: r.price?,
            customer_id: r.customer_id.as_deref()?,
            country: r.country.as_deref()?,
        })
    }
}

/// Turn the consolidated dataset into the clean and analysis datasets.
///
/// Rows with any missing cell are dropped, then cancelled invoices. The
/// remainder is split, typed, renamed and reordered into [`CleanRecord`]s.
/// The analysis rows add `sales_amount = round(price * quantity, 2)` and
/// keep only strictly positive amounts. Row order is preserved throughout.
#[instrument(level = "info", skip_all, fields(rows = dataset.len()))]
pub fn clean(dataset: &Dataset) -> PipelineResult<(Vec<CleanRecord>, Vec<AnalysisRecord>)> {
    // Keep each row's position in the consolidated dataset for error reports.
    let complete: Vec<(usize, CompleteRow<'_>)> = dataset
        .records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| CompleteRow::from_raw(r).map(|c| (i, c)))
        .collect();
    debug!(
        dropped = dataset.len() - complete.len(),
        "dropped rows with missing values"
    );

    let kept: Vec<(usize, CompleteRow<'_>)> = complete
        .into_iter()
        .filter(|(_, r)| !r.invoice.starts_with(CANCELLATION_MARKER))
        .collect();

    let clean = kept
        .iter()
        .map(|(row, r)| to_clean_record(*row, r))
        .collect::<PipelineResult<Vec<_>>>()?;

    let rows: Vec<usize> = kept.iter().map(|(row, _)| *row).collect();
    let analysis = analysis_records(&rows, &clean)?;

    info!(
        clean_rows = clean.len(),
        analysis_rows = analysis.len(),
        "cleaned consolidated dataset"
    );
    Ok((clean, analysis))
}

fn to_clean_record(row: usize, r: &CompleteRow<'_>) -> PipelineResult<CleanRecord> {
    Ok(CleanRecord {
        invoice_no: coerce_invoice(row, r.invoice)?,
        stock_code: r.stock_code.to_string(),
        customer_id: coerce_customer_id(row, r.customer_id)?,
        invoice_date: r.invoice_date.date(),
        invoice_time: r.invoice_date.time(),
        description: r.description.to_string(),
        country: r.country.to_string(),
        quantity: r.quantity,
        price: r.price,
    })
}

fn coerce_invoice(row: usize, raw: &str) -> PipelineResult<i32> {
    raw.trim().parse::<i32>().map_err(|e| PipelineError::Transform {
        row,
        message: format!("Invoice {:?} is not a 32-bit integer: {}", raw, e),
    })
}

/// Numeric ids such as `"13085.0"` are truncated toward zero.
fn coerce_customer_id(row: usize, raw: &str) -> PipelineResult<i32> {
    parse_decimal(raw)
        .and_then(|d| d.trunc().to_i32())
        .ok_or_else(|| PipelineError::Transform {
            row,
            message: format!("Customer ID {:?} is not a 32-bit integer", raw),
        })
}

/// `round(price * quantity, 2)`, ties to even. `None` if the product overflows.
pub fn sales_amount(price: Decimal, quantity: i64) -> Option<Decimal> {
    price
        .checked_mul(Decimal::from(quantity))
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
}

/// `rows[i]` is the consolidated-dataset position of `clean[i]`.
fn analysis_records(rows: &[usize], clean: &[CleanRecord]) -> PipelineResult<Vec<AnalysisRecord>> {
    let mut out = Vec::new();
    for (&row, r) in rows.iter().zip(clean) {
        let amount = sales_amount(r.price, r.quantity).ok_or_else(|| PipelineError::Transform {
            row,
            message: format!("price * quantity overflows ({} * {})", r.price, r.quantity),
        })?;
        if amount > Decimal::ZERO {
            out.push(AnalysisRecord {
                invoice_no: r.invoice_no,
                customer_id: r.customer_id,
                invoice_date: r.invoice_date,
                country: r.country.clone(),
                quantity: r.quantity,
                sales_amount: amount,
            });
        }
    }
    Ok(out)
}
