//! Core types and data structures for the ledger generator

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scale at which transaction values must cancel out
pub const BALANCE_SCALE: i64 = 8;

/// Significant digits kept when an exchange rate is derived by division
pub const RATE_PRECISION: u64 = 28;

/// Account types as understood by the accounting software import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountType {
    /// Amounts owed to the seller by the storefront
    Receivable,
    /// Per-currency holding accounts
    Asset,
    /// Commissions, taxes and adjustments
    Expense,
    /// Sales revenue
    Income,
}

impl AccountType {
    /// Name used in the `Type` column of the accounts table
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Receivable => "RECEIVABLE",
            AccountType::Asset => "ASSET",
            AccountType::Expense => "EXPENSE",
            AccountType::Income => "INCOME",
        }
    }
}

/// Types of entries in double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Debit entry, recorded with a positive amount
    Debit,
    /// Credit entry, recorded with a negative amount
    Credit,
}

impl EntryType {
    /// Apply the sign convention of this entry type to an amount
    pub fn signed(&self, amount: BigDecimal) -> BigDecimal {
        match self {
            EntryType::Debit => amount,
            EntryType::Credit => -amount,
        }
    }
}

/// One row of the accounts table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRow {
    pub account_type: AccountType,
    /// Colon-separated path, e.g. `Income:Sales:EUR`
    pub full_name: String,
    /// Last path component
    pub name: String,
    pub description: String,
    /// Commodity the account is kept in
    pub symbol: String,
    pub placeholder: bool,
}

/// A single leg of a ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub account: String,
    /// Signed amount: debits positive, credits negative
    pub amount: BigDecimal,
    /// Transaction number, assigned when the transaction is emitted
    pub number: Option<u64>,
    pub description: String,
    pub memo: String,
    /// Exchange rate into the bank currency, zero when the leg is not converted
    pub price: BigDecimal,
}

impl LedgerEntry {
    /// Create a new unnumbered entry
    pub fn new(
        date: NaiveDate,
        account: String,
        entry_type: EntryType,
        amount: BigDecimal,
        description: String,
    ) -> Self {
        Self {
            date,
            account,
            amount: entry_type.signed(amount),
            number: None,
            description,
            memo: String::new(),
            price: BigDecimal::zero(),
        }
    }

    /// Whether this leg carries a conversion price
    pub fn is_priced(&self) -> bool {
        !self.price.is_zero()
    }

    /// Value of the leg in the transaction's balancing currency
    pub fn value(&self) -> BigDecimal {
        if self.is_priced() {
            &self.amount * &self.price
        } else {
            self.amount.clone()
        }
    }
}

/// A dated group of entries that must balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub date: NaiveDate,
    pub entries: Vec<LedgerEntry>,
}

impl LedgerTransaction {
    /// Create an empty transaction
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entries: Vec::new(),
        }
    }

    /// Add an entry to the transaction
    pub fn add_entry(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Sum of all entry values, rounded to [`BALANCE_SCALE`]
    pub fn imbalance(&self) -> BigDecimal {
        let total: BigDecimal = self.entries.iter().map(LedgerEntry::value).sum();
        total.round(BALANCE_SCALE)
    }

    /// Check if the entries cancel out
    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }

    /// Number shared by the entries, if one has been assigned
    pub fn number(&self) -> Option<u64> {
        self.entries.first().and_then(|e| e.number)
    }

    pub(crate) fn assign_number(&mut self, number: u64) {
        for entry in &mut self.entries {
            entry.number = Some(number);
        }
    }

    /// Move the transaction and all of its entries to another date
    pub fn redate(&mut self, date: NaiveDate) {
        self.date = date;
        for entry in &mut self.entries {
            entry.date = date;
        }
    }
}

/// Exchange rate observation for the prices table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    /// Units of `to_currency` per unit of `from_currency`
    pub rate: BigDecimal,
    pub from_currency: String,
    pub to_currency: String,
}

/// One currency's results within a payment batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyLine {
    pub currency: String,
    pub earned: BigDecimal,
    pub input_tax: BigDecimal,
    pub adjustments: BigDecimal,
    pub withholding: BigDecimal,
    pub total: BigDecimal,
    /// Printed rate, units of bank currency per unit of `currency`
    pub exchange_rate: BigDecimal,
    /// `total` converted to the bank currency
    pub proceeds: BigDecimal,
    pub bank_currency: String,
}

impl CurrencyLine {
    /// Rate actually applied by the storefront, `proceeds / total`
    ///
    /// Falls back to the printed rate when the total is zero.
    pub fn effective_rate(&self) -> BigDecimal {
        effective_rate(&self.proceeds, &self.total, &self.exchange_rate)
    }

    /// Taxes withheld from this line (input tax plus withholding)
    pub fn taxes(&self) -> BigDecimal {
        &self.input_tax + &self.withholding
    }

    /// Whether the line settles in a different currency than it was earned in
    pub fn is_converted(&self) -> bool {
        self.currency != self.bank_currency
    }
}

pub(crate) fn effective_rate(
    proceeds: &BigDecimal,
    total: &BigDecimal,
    fallback: &BigDecimal,
) -> BigDecimal {
    if total.is_zero() {
        fallback.clone()
    } else {
        // drop the zero padding added by the precision cap
        (proceeds / total).with_prec(RATE_PRECISION).normalized()
    }
}

/// One period's sales from a per-country sales report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    /// Where the report came from, used in diagnostics
    pub source: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Partner share per currency
    pub earned: BTreeMap<String, BigDecimal>,
    /// Customer price per currency
    pub sales: BTreeMap<String, BigDecimal>,
    /// Storefront commission per currency
    pub commission: BTreeMap<String, BigDecimal>,
    /// One balanced transaction per sale row
    pub transactions: Vec<LedgerTransaction>,
}

impl SalesReport {
    /// Currencies the report has totals for
    pub fn currencies(&self) -> impl Iterator<Item = &String> {
        self.sales.keys()
    }

    /// Check that `sales - earned == commission` for every currency
    pub fn is_conserved(&self) -> bool {
        let zero = BigDecimal::zero();
        self.sales.iter().all(|(currency, sales)| {
            let earned = self.earned.get(currency).unwrap_or(&zero);
            let commission = self.commission.get(currency).unwrap_or(&zero);
            &(sales - earned) == commission
        })
    }
}

/// One settlement from a payment statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBatch {
    pub source: String,
    pub bank_currency: String,
    pub lines: Vec<CurrencyLine>,
    /// Settlement date, nominal until matched against a deposit
    pub date: NaiveDate,
    /// First day of the statement's earnings month
    pub period_start: NaiveDate,
    /// Settled amount from the statement summary row
    pub amount: BigDecimal,
    /// Destination account label from the statement
    pub account_label: String,
    /// Receivable, tax and adjustment transactions
    pub transactions: Vec<LedgerTransaction>,
    /// Conversion transactions produced by reconciliation
    pub conversions: Vec<LedgerTransaction>,
    pub prices: Vec<PriceRecord>,
}

impl PaymentBatch {
    /// Earned amount per currency, summing split rows
    pub fn earned_by_currency(&self) -> BTreeMap<String, BigDecimal> {
        let mut earned = BTreeMap::new();
        for line in &self.lines {
            *earned
                .entry(line.currency.clone())
                .or_insert_with(BigDecimal::zero) += &line.earned;
        }
        earned
    }

    /// Effective exchange rate per currency, summing split rows first
    pub fn effective_rates(&self) -> BTreeMap<String, BigDecimal> {
        let mut totals: BTreeMap<&str, (BigDecimal, BigDecimal, &BigDecimal)> = BTreeMap::new();
        for line in &self.lines {
            let slot = totals.entry(line.currency.as_str()).or_insert_with(|| {
                (BigDecimal::zero(), BigDecimal::zero(), &line.exchange_rate)
            });
            slot.0 += &line.proceeds;
            slot.1 += &line.total;
        }
        totals
            .into_iter()
            .map(|(currency, (proceeds, total, printed))| {
                (currency.to_string(), effective_rate(&proceeds, &total, printed))
            })
            .collect()
    }

    /// Move every transaction and price record of the batch to `date`
    pub fn redate(&mut self, date: NaiveDate) {
        self.date = date;
        for txn in self.transactions.iter_mut().chain(self.conversions.iter_mut()) {
            txn.redate(date);
        }
        for price in &mut self.prices {
            price.date = date;
        }
    }
}

/// A payout observed in the external deposit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub amount: BigDecimal,
    pub currency: String,
    pub account_label: String,
    pub units_sold: u64,
    pub deposit_date: NaiveDate,
    pub transaction_id: String,
}

/// Errors that can occur while building the ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{source_name}: partner share currency {partner_currency} differs from customer currency {customer_currency}")]
    CurrencyMismatch {
        source_name: String,
        partner_currency: String,
        customer_currency: String,
    },
    #[error("{source_name}: total proceeds {computed} do not match reported amount {reported}")]
    BalanceMismatch {
        source_name: String,
        computed: BigDecimal,
        reported: BigDecimal,
    },
    #[error("multiple bank currencies are not supported: {expected} and {found}")]
    MultipleBankCurrencies { expected: String, found: String },
    #[error("no deposit of {amount} found after {period_start}")]
    UnmatchedDeposit {
        amount: BigDecimal,
        period_start: NaiveDate,
    },
    #[error("could not parse date from header: {0}")]
    InvalidHeaderDate(String),
    #[error("{context}: {message}")]
    Parse { context: String, message: String },
    #[error("{source_name}: missing column '{column}'")]
    MissingColumn { source_name: String, column: String },
    #[error("transaction {number} does not balance, off by {imbalance}")]
    UnbalancedTransaction { number: u64, imbalance: BigDecimal },
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    pub(crate) fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
