//! Statement header period token

use chrono::{Month, NaiveDate};
use regex::Regex;

use crate::types::*;

/// Earnings period named by a statement header, e.g. `(March, 2024)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementPeriod {
    pub month: u32,
    pub year: i32,
}

impl StatementPeriod {
    /// First day of the period
    pub fn start(&self) -> LedgerResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            LedgerError::InvalidHeaderDate(format!("{}-{}", self.year, self.month))
        })
    }
}

/// Extract the `(MonthName, Year)` token from a header line
pub fn parse_period_token(header: &str) -> LedgerResult<StatementPeriod> {
    let pattern = Regex::new(r"\((\w+),\s*(\d{4})\)")
        .map_err(|e| LedgerError::parse("period pattern", e.to_string()))?;
    let captures = pattern
        .captures(header)
        .ok_or_else(|| LedgerError::InvalidHeaderDate(header.to_string()))?;

    let month = captures[1]
        .parse::<Month>()
        .map_err(|_| LedgerError::InvalidHeaderDate(header.to_string()))?;
    let year = captures[2]
        .parse::<i32>()
        .map_err(|_| LedgerError::InvalidHeaderDate(header.to_string()))?;

    Ok(StatementPeriod {
        month: month.number_from_month(),
        year,
    })
}
