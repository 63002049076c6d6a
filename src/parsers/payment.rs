//! Payment statement reader

use bigdecimal::{BigDecimal, Zero};
use csv::StringRecord;
use regex::Regex;

use super::header::parse_period_token;
use super::parse_decimal;
use crate::config::PipelineConfig;
use crate::ledger::patterns;
use crate::types::*;
use crate::utils::validate_currency_code;

/// Prefix of the first cell of every payment statement
pub const STATEMENT_SIGNATURE: &str = "iTunes Connect - Payments and Financial Reports";

/// First cell of the row that opens a currency table
pub const TABLE_HEADER: &str = "Country or Region (Currency)";

const EARNED: usize = 2;
const INPUT_TAX: usize = 4;
const ADJUSTMENTS: usize = 5;
const WITHHOLDING: usize = 6;
const TOTAL: usize = 7;
const EXCHANGE_RATE: usize = 8;
const PROCEEDS: usize = 9;
const BANK_CURRENCY: usize = 10;

fn cell(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or("")
}

fn first_filled(record: &StringRecord) -> Option<&str> {
    record.iter().map(str::trim).find(|value| !value.is_empty())
}

/// Reads comma-separated payment statements into payment batches
#[derive(Debug, Clone, Default)]
pub struct PaymentParser {
    config: PipelineConfig,
}

impl PaymentParser {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Parse one statement
    ///
    /// Returns `Ok(None)` when the content does not look like a payment
    /// statement; such files are skipped rather than treated as errors.
    pub fn parse(&self, source: &str, content: &str) -> LedgerResult<Option<Vec<PaymentBatch>>> {
        let records: Vec<StringRecord> = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes())
            .records()
            .collect::<Result<_, _>>()?;

        // the period token "(Month, Year)" spans two cells of the title row
        let title = records
            .first()
            .map(|first| first.iter().collect::<Vec<_>>().join(","))
            .unwrap_or_default();
        if !title.trim_start().starts_with(STATEMENT_SIGNATURE) {
            tracing::warn!(source, "Ignoring unknown file");
            return Ok(None);
        }

        let period = parse_period_token(&title)?;
        let period_start = period.start()?;
        let date = self
            .config
            .settlement_date_for(period.year, period.month)
            .unwrap_or(period_start);
        let currency_pattern = Regex::new(r"\(([A-Za-z]{3})\)")
            .map_err(|e| LedgerError::parse("currency pattern", e.to_string()))?;

        let mut batches = Vec::new();
        let mut index = 1;
        while index < records.len() {
            if cell(&records[index], 0) != TABLE_HEADER {
                index += 1;
                continue;
            }
            index += 1;

            let mut lines = Vec::new();
            while index < records.len() {
                let record = &records[index];
                index += 1;
                if cell(record, 0).is_empty() {
                    break;
                }
                // no exchange rate: nothing was settled for this currency
                if cell(record, EXCHANGE_RATE).is_empty() {
                    continue;
                }
                let context = format!("{} row {}", source, index);
                lines.push(parse_line(record, &currency_pattern, &context)?);
            }

            if lines.is_empty() {
                continue;
            }

            let summary = records.get(index).ok_or_else(|| {
                LedgerError::parse(source, "currency table has no summary row")
            })?;
            let amount_cell = first_filled(summary)
                .and_then(|value| value.split_whitespace().next())
                .ok_or_else(|| LedgerError::parse(source, "summary row is empty"))?;
            let amount = parse_decimal(amount_cell, source)?;
            let account_label = records
                .get(index + 1)
                .and_then(first_filled)
                .unwrap_or("")
                .to_string();
            index += 2;

            batches.push(self.build_batch(
                source,
                lines,
                amount,
                account_label,
                date,
                period_start,
            )?);
        }

        tracing::info!(source, batches = batches.len(), %date, "parsed payment statement");
        Ok(Some(batches))
    }

    fn build_batch(
        &self,
        source: &str,
        lines: Vec<CurrencyLine>,
        amount: BigDecimal,
        account_label: String,
        date: chrono::NaiveDate,
        period_start: chrono::NaiveDate,
    ) -> LedgerResult<PaymentBatch> {
        let computed = lines
            .iter()
            .fold(BigDecimal::zero(), |acc, line| acc + &line.proceeds);
        if computed != amount {
            return Err(LedgerError::BalanceMismatch {
                source_name: source.to_string(),
                computed,
                reported: amount,
            });
        }

        let bank_currency = lines[0].bank_currency.clone();
        if let Some(other) = lines.iter().find(|line| line.bank_currency != bank_currency) {
            return Err(LedgerError::MultipleBankCurrencies {
                expected: bank_currency,
                found: other.bank_currency.clone(),
            });
        }

        let accounts = &self.config.accounts;
        let mut transactions = vec![patterns::create_settlement(
            accounts,
            date,
            &account_label,
            &amount,
            &lines,
        )?];
        for line in &lines {
            if let Some(txn) = patterns::create_tax_and_adjustment(accounts, date, line)? {
                transactions.push(txn);
            }
        }

        let prices = lines
            .iter()
            .filter(|line| line.is_converted())
            .map(|line| PriceRecord {
                date,
                rate: line.exchange_rate.clone(),
                from_currency: line.currency.clone(),
                to_currency: line.bank_currency.clone(),
            })
            .collect();

        Ok(PaymentBatch {
            source: source.to_string(),
            bank_currency,
            lines,
            date,
            period_start,
            amount,
            account_label,
            transactions,
            conversions: Vec::new(),
            prices,
        })
    }
}

fn parse_line(
    record: &StringRecord,
    currency_pattern: &Regex,
    context: &str,
) -> LedgerResult<CurrencyLine> {
    let region = cell(record, 0);
    let currency = currency_pattern
        .captures(region)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| {
            LedgerError::parse(context, format!("no currency code in '{}'", region))
        })?;
    validate_currency_code(&currency)?;
    let bank_currency = cell(record, BANK_CURRENCY).to_string();
    validate_currency_code(&bank_currency)?;

    Ok(CurrencyLine {
        currency,
        earned: parse_decimal(cell(record, EARNED), context)?,
        input_tax: parse_decimal(cell(record, INPUT_TAX), context)?,
        adjustments: parse_decimal(cell(record, ADJUSTMENTS), context)?,
        withholding: parse_decimal(cell(record, WITHHOLDING), context)?,
        total: parse_decimal(cell(record, TOTAL), context)?,
        exchange_rate: parse_decimal(cell(record, EXCHANGE_RATE), context)?,
        proceeds: parse_decimal(cell(record, PROCEEDS), context)?,
        bank_currency,
    })
}
