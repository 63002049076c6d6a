//! In-memory sink and sequence store for testing and embedding

use bigdecimal::{BigDecimal, Zero};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<AccountRow>,
    entries: Vec<LedgerEntry>,
    prices: Vec<PriceRecord>,
}

/// Sink that keeps the generated tables in memory
///
/// Clones share the same tables, so a clone handed to the pipeline can be
/// inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: Arc<RwLock<Tables>>,
}

impl MemorySink {
    /// Create a new empty sink
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn accounts(&self) -> Vec<AccountRow> {
        self.read().accounts.clone()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.read().entries.clone()
    }

    pub fn prices(&self) -> Vec<PriceRecord> {
        self.read().prices.clone()
    }

    /// Sum of all amounts posted to an account
    pub fn balance(&self, account: &str) -> BigDecimal {
        self.read()
            .entries
            .iter()
            .filter(|e| e.account == account)
            .fold(BigDecimal::zero(), |acc, e| acc + &e.amount)
    }

    /// Clear all data
    pub fn clear(&self) {
        let mut tables = self.write();
        tables.accounts.clear();
        tables.entries.clear();
        tables.prices.clear();
    }
}

impl LedgerSink for MemorySink {
    fn write_accounts(&mut self, accounts: &[AccountRow]) -> LedgerResult<()> {
        self.write().accounts = accounts.to_vec();
        Ok(())
    }

    fn write_transactions(&mut self, entries: &[LedgerEntry]) -> LedgerResult<()> {
        self.write().entries = entries.to_vec();
        Ok(())
    }

    fn write_prices(&mut self, prices: &[PriceRecord]) -> LedgerResult<()> {
        self.write().prices = prices.to_vec();
        Ok(())
    }
}

/// Sequence store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemorySequenceStore {
    next: Option<u64>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously stored high-water mark
    pub fn with_next(next: u64) -> Self {
        Self { next: Some(next) }
    }
}

impl SequenceStore for MemorySequenceStore {
    fn load(&self) -> LedgerResult<Option<u64>> {
        Ok(self.next)
    }

    fn save(&mut self, next: u64) -> LedgerResult<()> {
        self.next = Some(next);
        Ok(())
    }
}
