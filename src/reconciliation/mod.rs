//! Reconciliation of sales reports against payment batches
//!
//! Nothing in a payment statement names the sales reports it pays out. A
//! report is tied to a batch when, for at least one currency, the report's
//! partner share total equals the batch's earned amount for that currency
//! exactly. Only a unique candidate counts as a match; the currency totals of
//! a matched report are then converted into the bank currency at the batch's
//! effective exchange rates.

pub mod deposits;

pub use deposits::*;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::AccountNames;
use crate::ledger::patterns;
use crate::types::*;

/// Why a report could not be reconciled; the run continues without its conversions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationIssue {
    /// No open batch shares an earned total with the report
    Unmatched { report: String },
    /// Several open batches share an earned total with the report
    Ambiguous {
        report: String,
        candidates: Vec<String>,
    },
}

impl std::fmt::Display for ReconciliationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciliationIssue::Unmatched { report } => {
                write!(f, "no payment found for sales report {}", report)
            }
            ReconciliationIssue::Ambiguous { report, candidates } => write!(
                f,
                "sales report {} matches several payments: {}",
                report,
                candidates.join(", ")
            ),
        }
    }
}

/// A report paired with the batch that settled it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMatch {
    pub report: usize,
    pub batch: usize,
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub matches: Vec<ReportMatch>,
    pub issues: Vec<ReconciliationIssue>,
}

/// Open batches whose earned amount equals the report's for some shared currency
pub fn find_candidates(
    report: &SalesReport,
    batches: &[PaymentBatch],
    consumed: &BTreeSet<usize>,
) -> Vec<usize> {
    batches
        .iter()
        .enumerate()
        .filter(|(index, _)| !consumed.contains(index))
        .filter(|(_, batch)| {
            let earned = batch.earned_by_currency();
            report
                .earned
                .iter()
                .any(|(currency, amount)| earned.get(currency) == Some(amount))
        })
        .map(|(index, _)| index)
        .collect()
}

/// Pairs sales reports with payment batches and emits the conversion transactions
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    accounts: AccountNames,
}

impl ReconciliationEngine {
    pub fn new(accounts: AccountNames) -> Self {
        Self { accounts }
    }

    /// Reconcile every report, in order, against the batches not matched yet
    ///
    /// Conversion transactions are attached to the matched batch so that they
    /// follow it if the batch is later re-dated.
    pub fn reconcile(
        &self,
        reports: &[SalesReport],
        batches: &mut [PaymentBatch],
    ) -> LedgerResult<ReconciliationSummary> {
        let mut consumed = BTreeSet::new();
        let mut summary = ReconciliationSummary::default();

        for (report_index, report) in reports.iter().enumerate() {
            let candidates = find_candidates(report, batches, &consumed);
            match candidates.as_slice() {
                [] => {
                    tracing::warn!(report = %report.source, "No payment found for sales report");
                    summary.issues.push(ReconciliationIssue::Unmatched {
                        report: report.source.clone(),
                    });
                }
                [batch_index] => {
                    let batch = &mut batches[*batch_index];
                    let conversions = self.conversions(report, batch)?;
                    tracing::debug!(
                        report = %report.source,
                        batch = %batch.source,
                        conversions = conversions.len(),
                        "matched sales report"
                    );
                    batch.conversions.extend(conversions);
                    consumed.insert(*batch_index);
                    summary.matches.push(ReportMatch {
                        report: report_index,
                        batch: *batch_index,
                    });
                }
                many => {
                    let candidates: Vec<String> = many
                        .iter()
                        .map(|&i| format!("{} ({})", batches[i].source, batches[i].date))
                        .collect();
                    tracing::warn!(
                        report = %report.source,
                        candidates = candidates.len(),
                        "Ambiguous payment match for sales report"
                    );
                    summary.issues.push(ReconciliationIssue::Ambiguous {
                        report: report.source.clone(),
                        candidates,
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Commission and sales conversions for every currency the batch has a rate for
    pub fn conversions(
        &self,
        report: &SalesReport,
        batch: &PaymentBatch,
    ) -> LedgerResult<Vec<LedgerTransaction>> {
        let rates: BTreeMap<String, BigDecimal> = batch.effective_rates();
        let mut transactions = Vec::new();

        for (currency, rate) in &rates {
            if let Some(commission) = report.commission.get(currency) {
                if !commission.is_zero() {
                    transactions.push(patterns::create_commission_conversion(
                        &self.accounts,
                        batch.date,
                        currency,
                        commission,
                        rate,
                    )?);
                }
            }
            if let Some(sales) = report.sales.get(currency) {
                if !sales.is_zero() {
                    transactions.push(patterns::create_sales_conversion(
                        &self.accounts,
                        batch.date,
                        currency,
                        sales,
                        rate,
                    )?);
                }
            }
        }

        Ok(transactions)
    }
}
