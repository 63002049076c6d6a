//! Ledger builder that numbers, checks and assembles the final entry stream

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::AccountNames;
use crate::ledger::{create_chart_of_accounts, TransactionSequence};
use crate::traits::*;
use crate::types::*;

/// The generated tables, ready for a [`LedgerSink`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub bank_currency: Option<String>,
    pub accounts: Vec<AccountRow>,
    /// Sorted by date; transactions on the same date keep emission order
    pub transactions: Vec<LedgerTransaction>,
    /// Sorted by date
    pub prices: Vec<PriceRecord>,
}

impl Ledger {
    /// All legs in output order
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.transactions
            .iter()
            .flat_map(|txn| txn.entries.iter().cloned())
            .collect()
    }

    /// Hand the three tables to a sink
    pub fn write_to(&self, sink: &mut dyn LedgerSink) -> LedgerResult<()> {
        sink.write_accounts(&self.accounts)?;
        sink.write_transactions(&self.entries())?;
        sink.write_prices(&self.prices)?;
        Ok(())
    }

    /// Validate the integrity of the ledger
    pub fn validate_integrity(&self) -> LedgerIntegrityReport {
        let mut issues = Vec::new();
        let mut numbers = BTreeSet::new();

        for txn in &self.transactions {
            match txn.number() {
                Some(number) => {
                    if !numbers.insert(number) {
                        issues.push(format!("Transaction number {} is used twice", number));
                    }
                }
                None => issues.push(format!("Transaction dated {} has no number", txn.date)),
            }

            if !txn.is_balanced() {
                issues.push(format!(
                    "Transaction {} is not balanced: off by {}",
                    txn.number().unwrap_or_default(),
                    txn.imbalance()
                ));
            }
        }

        let known: BTreeSet<&str> = self.accounts.iter().map(|a| a.full_name.as_str()).collect();
        for entry in self.transactions.iter().flat_map(|txn| &txn.entries) {
            if !known.contains(entry.account.as_str()) {
                issues.push(format!("Account '{}' is not in the chart", entry.account));
            }
        }
        issues.dedup();

        LedgerIntegrityReport {
            is_valid: issues.is_empty(),
            issues,
            transaction_count: self.transactions.len(),
            entry_count: self.transactions.iter().map(|t| t.entries.len()).sum(),
        }
    }
}

/// Report on ledger integrity and validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIntegrityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub transaction_count: usize,
    pub entry_count: usize,
}

/// Resolve the single settlement currency of a run
///
/// Every batch must settle in the same currency, and in the configured one
/// when the configuration names it.
pub fn resolve_bank_currency(
    batches: &[PaymentBatch],
    configured: Option<&str>,
) -> LedgerResult<Option<String>> {
    let mut bank_currency = configured.map(str::to_string);
    for batch in batches {
        match &bank_currency {
            None => bank_currency = Some(batch.bank_currency.clone()),
            Some(expected) if *expected != batch.bank_currency => {
                return Err(LedgerError::MultipleBankCurrencies {
                    expected: expected.clone(),
                    found: batch.bank_currency.clone(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(bank_currency)
}

/// Assigns transaction numbers and enforces the balance invariant
pub struct LedgerBuilder {
    accounts: AccountNames,
    sequence: TransactionSequence,
    validator: Box<dyn TransactionValidator>,
    bank_currency: Option<String>,
    currencies: BTreeSet<String>,
    transactions: Vec<LedgerTransaction>,
    prices: Vec<PriceRecord>,
}

impl LedgerBuilder {
    /// Create a new builder numbering from `sequence`
    pub fn new(accounts: AccountNames, sequence: TransactionSequence) -> Self {
        Self::with_validator(accounts, sequence, Box::new(DefaultTransactionValidator))
    }

    /// Create a new builder with a custom validator
    pub fn with_validator(
        accounts: AccountNames,
        sequence: TransactionSequence,
        validator: Box<dyn TransactionValidator>,
    ) -> Self {
        Self {
            accounts,
            sequence,
            validator,
            bank_currency: None,
            currencies: BTreeSet::new(),
            transactions: Vec::new(),
            prices: Vec::new(),
        }
    }

    /// Fix the settlement currency up front
    pub fn set_bank_currency(&mut self, currency: Option<String>) {
        self.bank_currency = currency;
    }

    /// Number a transaction and append it; an unbalanced transaction halts the run
    pub fn emit(&mut self, mut transaction: LedgerTransaction) -> LedgerResult<u64> {
        let number = self.sequence.next_number();
        transaction.assign_number(number);
        self.validator.validate_transaction(&transaction)?;
        tracing::debug!(
            number,
            date = %transaction.date,
            legs = transaction.entries.len(),
            "emitted transaction"
        );
        self.transactions.push(transaction);
        Ok(number)
    }

    /// Emit one transaction per sale of a report
    pub fn add_report(&mut self, report: SalesReport) -> LedgerResult<()> {
        self.currencies.extend(report.sales.keys().cloned());
        for transaction in report.transactions {
            self.emit(transaction)?;
        }
        Ok(())
    }

    /// Emit a batch's settlement, tax and conversion transactions
    pub fn add_batch(&mut self, batch: PaymentBatch) -> LedgerResult<()> {
        match &self.bank_currency {
            None => self.bank_currency = Some(batch.bank_currency.clone()),
            Some(expected) if *expected != batch.bank_currency => {
                return Err(LedgerError::MultipleBankCurrencies {
                    expected: expected.clone(),
                    found: batch.bank_currency,
                });
            }
            Some(_) => {}
        }

        self.currencies
            .extend(batch.lines.iter().map(|line| line.currency.clone()));
        for transaction in batch.transactions.into_iter().chain(batch.conversions) {
            self.emit(transaction)?;
        }
        self.prices.extend(batch.prices);
        Ok(())
    }

    /// Assemble the ledger and hand back the sequence for persistence
    pub fn finish(self) -> (Ledger, TransactionSequence) {
        let mut transactions = self.transactions;
        transactions.sort_by_key(|txn| txn.date);
        let mut prices = self.prices;
        prices.sort_by_key(|price| price.date);

        let symbol = match &self.bank_currency {
            Some(currency) => currency.clone(),
            None => {
                tracing::warn!("No settlement currency known, top-level accounts have no symbol");
                String::new()
            }
        };
        let accounts = create_chart_of_accounts(&self.accounts, &symbol, &self.currencies);

        tracing::info!(
            transactions = transactions.len(),
            prices = prices.len(),
            accounts = accounts.len(),
            "ledger assembled"
        );

        (
            Ledger {
                bank_currency: self.bank_currency,
                accounts,
                transactions,
                prices,
            },
            self.sequence,
        )
    }
}
