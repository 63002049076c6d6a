//! Run configuration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::*;

const INDEX_FILE_NAME: &str = "storefront-ledger_index";

/// Names of the accounts the generated transactions post to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountNames {
    /// Aggregate receivable in the bank currency, parent of the per-currency receivables
    pub receivable: String,
    pub tax: String,
    pub adjustment: String,
    /// Parent of the per-currency commission accounts
    pub commission: String,
    /// Parent of the per-currency sales accounts
    pub sales: String,
}

impl Default for AccountNames {
    fn default() -> Self {
        Self {
            receivable: "Assets:Accounts Receivable".to_string(),
            tax: "Expenses:Taxes:Other Tax".to_string(),
            adjustment: "Expenses:Adjustment".to_string(),
            commission: "Expenses:Commissions".to_string(),
            sales: "Income:Sales".to_string(),
        }
    }
}

impl AccountNames {
    pub fn receivable_in(&self, currency: &str) -> String {
        format!("{}:{}", self.receivable, currency)
    }

    pub fn commission_in(&self, currency: &str) -> String {
        format!("{}:{}", self.commission, currency)
    }

    pub fn sales_in(&self, currency: &str) -> String {
        format!("{}:{}", self.sales, currency)
    }

    /// Reject empty names and names that would collide
    pub fn validate(&self) -> LedgerResult<()> {
        let names = [
            &self.receivable,
            &self.tax,
            &self.adjustment,
            &self.commission,
            &self.sales,
        ];
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(LedgerError::Config("account names cannot be empty".into()));
            }
            if names[..i].contains(name) {
                return Err(LedgerError::Config(format!(
                    "account '{}' is configured more than once",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub accounts: AccountNames,
    /// Expected settlement currency; every statement must settle in it
    pub bank_currency: Option<String>,
    /// Actual settlement dates keyed by statement period (`YYYY-MM`)
    pub period_calendar: BTreeMap<String, NaiveDate>,
    /// Where the transaction number high-water mark is kept
    pub index_file: Option<PathBuf>,
    /// Write the final high-water mark back after a successful run
    pub persist_index: bool,
}

impl PipelineConfig {
    /// Parse a configuration from JSON
    pub fn from_json_str(content: &str) -> LedgerResult<Self> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_json_file(path: &Path) -> LedgerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        self.accounts.validate()?;
        if let Some(currency) = &self.bank_currency {
            crate::utils::validate_currency_code(currency)?;
        }
        for period in self.period_calendar.keys() {
            parse_period_key(period)?;
        }
        Ok(())
    }

    /// Calendar override for a statement period, if configured
    pub fn settlement_date_for(&self, year: i32, month: u32) -> Option<NaiveDate> {
        self.period_calendar
            .get(&format!("{:04}-{:02}", year, month))
            .copied()
    }

    /// Configured index file, or the default one in the user's config directory
    pub fn index_path(&self) -> Option<PathBuf> {
        self.index_file
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join(INDEX_FILE_NAME)))
    }
}

fn parse_period_key(key: &str) -> LedgerResult<(i32, u32)> {
    let invalid = || LedgerError::Config(format!("invalid calendar period '{}'", key));
    let (year, month) = key.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}
