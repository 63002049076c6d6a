//! Readers for the storefront's report formats
//!
//! Each parser turns one input text into normalized records carrying
//! unnumbered, already balanced ledger transactions.

pub mod deposit_log;
pub mod header;
pub mod payment;
pub mod sales_report;

pub use deposit_log::*;
pub use header::*;
pub use payment::*;
pub use sales_report::*;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use crate::types::*;

const REPORT_DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Parse a decimal cell, tolerating surrounding blanks and thousands separators
pub(crate) fn parse_decimal(cell: &str, context: &str) -> LedgerResult<BigDecimal> {
    let cleaned = cell.trim().replace(',', "");
    BigDecimal::from_str(&cleaned)
        .map_err(|e| LedgerError::parse(context, format!("invalid decimal '{}': {}", cell, e)))
}

/// Parse a report date in any of the formats the storefront uses
pub(crate) fn parse_report_date(cell: &str, context: &str) -> LedgerResult<NaiveDate> {
    let cell = cell.trim();
    REPORT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
        .ok_or_else(|| LedgerError::parse(context, format!("invalid date '{}'", cell)))
}
