//! Matching of deposit log entries to payment batches

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::*;

/// A deposit paired with the batch it paid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositMatch {
    pub batch: usize,
    pub transaction_id: String,
    pub deposit_date: chrono::NaiveDate,
}

/// Re-dates payment batches to the day their money actually arrived
#[derive(Debug, Clone, Default)]
pub struct PaymentLogMatcher {
    deposits: Vec<DepositRecord>,
}

impl PaymentLogMatcher {
    pub fn new(deposits: Vec<DepositRecord>) -> Self {
        Self { deposits }
    }

    /// Match every batch, in order, to the first unused deposit paying the
    /// same amount strictly after the batch's period began
    ///
    /// A batch with no such deposit is fatal: its date could not be verified.
    pub fn apply(&self, batches: &mut [PaymentBatch]) -> LedgerResult<Vec<DepositMatch>> {
        let mut consumed = BTreeSet::new();
        let mut matches = Vec::with_capacity(batches.len());

        for (index, batch) in batches.iter_mut().enumerate() {
            let found = self.deposits.iter().enumerate().find(|(position, deposit)| {
                !consumed.contains(position)
                    && deposit.amount == batch.amount
                    && deposit.deposit_date > batch.period_start
            });

            let Some((position, deposit)) = found else {
                return Err(LedgerError::UnmatchedDeposit {
                    amount: batch.amount.clone(),
                    period_start: batch.period_start,
                });
            };

            if batch.bank_currency != deposit.currency {
                tracing::warn!(
                    batch = %batch.source,
                    deposit = %deposit.currency,
                    statement = %batch.bank_currency,
                    "Deposit currency differs from statement bank currency"
                );
            }
            tracing::debug!(
                batch = %batch.source,
                transaction_id = %deposit.transaction_id,
                from = %batch.date,
                to = %deposit.deposit_date,
                "re-dating payment"
            );
            batch.redate(deposit.deposit_date);
            consumed.insert(position);
            matches.push(DepositMatch {
                batch: index,
                transaction_id: deposit.transaction_id.clone(),
                deposit_date: deposit.deposit_date,
            });
        }

        let unused = self.deposits.len() - consumed.len();
        if unused > 0 {
            tracing::info!(unused, "logged deposits without a payment statement");
        }
        Ok(matches)
    }
}
