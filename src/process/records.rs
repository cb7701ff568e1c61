use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::process::utils::float_like;

/// Header names every interim CSV must carry.
pub const COL_INVOICE: &str = "Invoice";
pub const COL_STOCK_CODE: &str = "StockCode";
pub const COL_DESCRIPTION: &str = "Description";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_INVOICE_DATE: &str = "InvoiceDate";
pub const COL_PRICE: &str = "Price";
pub const COL_CUSTOMER_ID: &str = "Customer ID";
pub const COL_COUNTRY: &str = "Country";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_INVOICE,
    COL_STOCK_CODE,
    COL_DESCRIPTION,
    COL_QUANTITY,
    COL_INVOICE_DATE,
    COL_PRICE,
    COL_CUSTOMER_ID,
    COL_COUNTRY,
];

pub const CLEAN_COLUMNS: [&str; 9] = [
    "invoice_no",
    "stock_code",
    "customer_id",
    "invoice_date",
    "invoice_time",
    "description",
    "country",
    "quantity",
    "price",
];

pub const ANALYSIS_COLUMNS: [&str; 6] = [
    "invoice_no",
    "customer_id",
    "invoice_date",
    "country",
    "quantity",
    "sales_amount",
];

/// One interim CSV row. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub invoice: Option<String>,
    pub stock_code: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub invoice_date: Option<NaiveDateTime>,
    pub price: Option<Decimal>,
    /// Kept as text until coercion so a malformed id fails the clean step.
    pub customer_id: Option<String>,
    pub country: Option<String>,
    /// Values of any non-required columns, aligned with `Dataset::extra_columns`.
    pub extra: Vec<Option<String>>,
}

/// The union of every interim CSV, in file order then row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Non-required columns, in the first file's header order.
    pub extra_columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    pub invoice_no: i32,
    pub stock_code: String,
    pub customer_id: i32,
    pub invoice_date: NaiveDate,
    #[serde(serialize_with = "serialize_time")]
    pub invoice_time: NaiveTime,
    pub description: String,
    pub country: String,
    pub quantity: i64,
    #[serde(serialize_with = "serialize_float_like")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub invoice_no: i32,
    pub customer_id: i32,
    pub invoice_date: NaiveDate,
    pub country: String,
    pub quantity: i64,
    #[serde(serialize_with = "serialize_float_like")]
    pub sales_amount: Decimal,
}

fn serialize_float_like<S: Serializer>(d: &Decimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&float_like(d))
}

fn serialize_time<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    let fmt = if t.nanosecond() == 0 {
        "%H:%M:%S"
    } else {
        "%H:%M:%S%.6f"
    };
    s.serialize_str(&t.format(fmt).to_string())
}
