//! Traits for output and persistence abstraction

use crate::types::*;

/// Destination for the generated tables
///
/// The ledger generator only produces rows; writing them somewhere (CSV files,
/// a database, an accounting package's API) is left to implementations of this
/// trait.
pub trait LedgerSink {
    /// Receive the chart of accounts
    fn write_accounts(&mut self, accounts: &[AccountRow]) -> LedgerResult<()>;

    /// Receive every transaction leg, already sorted by date
    fn write_transactions(&mut self, entries: &[LedgerEntry]) -> LedgerResult<()>;

    /// Receive the exchange-rate records, already sorted by date
    fn write_prices(&mut self, prices: &[PriceRecord]) -> LedgerResult<()>;
}

/// Persistence for the transaction number high-water mark
///
/// Lets repeated runs over time keep numbering where the previous run stopped.
pub trait SequenceStore {
    /// Load the next unused number, `None` if nothing was stored yet
    fn load(&self) -> LedgerResult<Option<u64>>;

    /// Store the next unused number
    fn save(&mut self, next: u64) -> LedgerResult<()>;
}

/// Trait for implementing transaction validation rules
pub trait TransactionValidator {
    /// Validate a transaction before it is emitted
    fn validate_transaction(&self, transaction: &LedgerTransaction) -> LedgerResult<()>;
}

/// Default transaction validator with basic double-entry rules
pub struct DefaultTransactionValidator;

impl TransactionValidator for DefaultTransactionValidator {
    fn validate_transaction(&self, transaction: &LedgerTransaction) -> LedgerResult<()> {
        if transaction.entries.len() < 2 {
            return Err(LedgerError::InvalidTransaction(
                "Transaction must have at least two entries for double-entry bookkeeping"
                    .to_string(),
            ));
        }

        if !transaction.is_balanced() {
            return Err(LedgerError::UnbalancedTransaction {
                number: transaction.number().unwrap_or_default(),
                imbalance: transaction.imbalance(),
            });
        }

        Ok(())
    }
}
