//! CSV writer for the accounts, transactions and prices tables

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::traits::*;
use crate::types::*;

/// Date format understood by the accounting software import
pub const DATE_FORMAT: &str = "%m/%d/%Y";

const ACCOUNT_HEADERS: [&str; 12] = [
    "Type",
    "Full Account Name",
    "Account Name",
    "Account Code",
    "Description",
    "Account Color",
    "Notes",
    "Symbol",
    "Namespace",
    "Hidden",
    "Tax Info",
    "Placeholder",
];

const TRANSACTION_HEADERS: [&str; 7] = [
    "Date",
    "Account",
    "Amount",
    "Number",
    "Description",
    "Memo",
    "Price",
];

const PRICE_HEADERS: [&str; 5] = [
    "Date",
    "Amount",
    "From Namespace",
    "From Symbol",
    "Currency To",
];

const NAMESPACE: &str = "CURRENCY";

/// Writes `accounts.csv`, `transactions.csv` and `prices.csv` into a directory
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.dir.join("accounts.csv")
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.dir.join("transactions.csv")
    }

    pub fn prices_path(&self) -> PathBuf {
        self.dir.join("prices.csv")
    }

    fn writer(&self, path: &Path) -> LedgerResult<csv::Writer<std::fs::File>> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(csv::Writer::from_path(path)?)
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "T"
    } else {
        "F"
    }
}

fn date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn decimal(value: &BigDecimal) -> String {
    value.to_plain_string()
}

impl LedgerSink for CsvSink {
    fn write_accounts(&mut self, accounts: &[AccountRow]) -> LedgerResult<()> {
        let path = self.accounts_path();
        let mut writer = self.writer(&path)?;
        writer.write_record(ACCOUNT_HEADERS)?;
        for account in accounts {
            writer.write_record([
                account.account_type.as_str(),
                account.full_name.as_str(),
                account.name.as_str(),
                "",
                account.description.as_str(),
                "",
                "",
                account.symbol.as_str(),
                NAMESPACE,
                flag(false),
                flag(false),
                flag(account.placeholder),
            ])?;
        }
        writer.flush()?;
        tracing::info!("Accounts written to {}", path.display());
        Ok(())
    }

    fn write_transactions(&mut self, entries: &[LedgerEntry]) -> LedgerResult<()> {
        let path = self.transactions_path();
        let mut writer = self.writer(&path)?;
        writer.write_record(TRANSACTION_HEADERS)?;
        for entry in entries {
            writer.write_record([
                date(&entry.date),
                entry.account.clone(),
                decimal(&entry.amount),
                entry.number.map(|n| n.to_string()).unwrap_or_default(),
                entry.description.clone(),
                entry.memo.clone(),
                decimal(&entry.price),
            ])?;
        }
        writer.flush()?;
        tracing::info!("Transactions written to {}", path.display());
        Ok(())
    }

    fn write_prices(&mut self, prices: &[PriceRecord]) -> LedgerResult<()> {
        let path = self.prices_path();
        let mut writer = self.writer(&path)?;
        writer.write_record(PRICE_HEADERS)?;
        for price in prices {
            writer.write_record([
                date(&price.date),
                decimal(&price.rate),
                NAMESPACE.to_string(),
                price.from_currency.clone(),
                price.to_currency.clone(),
            ])?;
        }
        writer.flush()?;
        tracing::info!("Rates written to {}", path.display());
        Ok(())
    }
}
