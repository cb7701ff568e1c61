use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Markers a spreadsheet export uses for a missing cell, besides the empty string.
pub const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns the field unchanged, or `None` if it is one of the null markers.
pub fn non_null(raw: &str) -> Option<&str> {
    if NULL_TOKENS.contains(&raw) {
        None
    } else {
        Some(raw)
    }
}

/// Parse a plain or scientific decimal literal.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Parse an integral quantity; `"3"` and `"3.0"` are both accepted.
pub fn parse_integral(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let d = parse_decimal(s)?;
    if d.fract().is_zero() {
        d.to_i64()
    } else {
        None
    }
}

/// Render a decimal the way a float column prints: `2.5`, `5.0`, `-0.75`.
pub fn float_like(d: &Decimal) -> String {
    let n = d.normalize();
    if n.scale() == 0 {
        format!("{}.0", n)
    } else {
        n.to_string()
    }
}
