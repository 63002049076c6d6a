//! Transaction construction

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;

use crate::config::AccountNames;
use crate::traits::*;
use crate::types::*;

/// Transaction builder for assembling balanced leg groups
#[derive(Debug)]
pub struct TransactionBuilder {
    transaction: LedgerTransaction,
    description: String,
}

impl TransactionBuilder {
    /// Create a new transaction builder; every leg shares the description
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            transaction: LedgerTransaction::new(date),
            description: description.into(),
        }
    }

    fn push(mut self, account: String, entry_type: EntryType, amount: BigDecimal) -> Self {
        let entry = LedgerEntry::new(
            self.transaction.date,
            account,
            entry_type,
            amount,
            self.description.clone(),
        );
        self.transaction.add_entry(entry);
        self
    }

    /// Add a debit entry
    pub fn debit(self, account: impl Into<String>, amount: BigDecimal) -> Self {
        self.push(account.into(), EntryType::Debit, amount)
    }

    /// Add a credit entry
    pub fn credit(self, account: impl Into<String>, amount: BigDecimal) -> Self {
        self.push(account.into(), EntryType::Credit, amount)
    }

    /// Set the memo of the last added entry
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        if let Some(entry) = self.transaction.entries.last_mut() {
            entry.memo = memo.into();
        }
        self
    }

    /// Set the conversion price of the last added entry
    pub fn price(mut self, price: BigDecimal) -> Self {
        if let Some(entry) = self.transaction.entries.last_mut() {
            entry.price = price;
        }
        self
    }

    /// Build the transaction
    pub fn build(self) -> LedgerResult<LedgerTransaction> {
        DefaultTransactionValidator.validate_transaction(&self.transaction)?;
        Ok(self.transaction)
    }
}

/// One row of a sales report, already totalled
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub date: NaiveDate,
    pub title: String,
    pub currency: String,
    /// Customer price times quantity
    pub customer_total: BigDecimal,
    /// Partner share times quantity
    pub partner_total: BigDecimal,
}

impl SaleLine {
    pub fn commission(&self) -> BigDecimal {
        &self.customer_total - &self.partner_total
    }
}

/// Posting patterns used by the parsers and the reconciliation engine
pub mod patterns {
    use super::*;

    /// A sale: credit local sales, debit local receivable and commission
    pub fn create_sale(accounts: &AccountNames, sale: &SaleLine) -> LedgerResult<LedgerTransaction> {
        TransactionBuilder::new(sale.date, sale.title.clone())
            .credit(accounts.sales_in(&sale.currency), sale.customer_total.clone())
            .debit(
                accounts.receivable_in(&sale.currency),
                sale.partner_total.clone(),
            )
            .debit(accounts.commission_in(&sale.currency), sale.commission())
            .memo("Commission")
            .build()
    }

    /// A settlement: debit the aggregate receivable with the paid amount,
    /// credit each currency's receivable with its total at the effective rate
    pub fn create_settlement(
        accounts: &AccountNames,
        date: NaiveDate,
        account_label: &str,
        amount: &BigDecimal,
        lines: &[CurrencyLine],
    ) -> LedgerResult<LedgerTransaction> {
        let mut builder = TransactionBuilder::new(date, account_label)
            .debit(accounts.receivable.clone(), amount.clone());
        for line in lines {
            builder = builder
                .credit(accounts.receivable_in(&line.currency), line.total.clone())
                .price(line.effective_rate());
        }
        builder.build()
    }

    /// Taxes and adjustments withheld from one currency line
    ///
    /// Returns `None` when the line has neither taxes nor adjustments. A tax
    /// offset by an equal adjustment still books both expense legs; the
    /// receivable leg is left out when nothing was withheld in total.
    pub fn create_tax_and_adjustment(
        accounts: &AccountNames,
        date: NaiveDate,
        line: &CurrencyLine,
    ) -> LedgerResult<Option<LedgerTransaction>> {
        let taxes = line.taxes();
        let adjustments = line.adjustments.clone();
        if taxes.is_zero() && adjustments.is_zero() {
            return Ok(None);
        }

        let rate = line.effective_rate();
        let mut builder =
            TransactionBuilder::new(date, format!("{} Taxes and Adjustments", line.currency));
        if !taxes.is_zero() {
            builder = builder
                .debit(accounts.tax.clone(), -&taxes * &rate)
                .memo("Tax");
        }
        if !adjustments.is_zero() {
            builder = builder
                .debit(accounts.adjustment.clone(), -&adjustments * &rate)
                .memo("Adjustment");
        }
        let withheld = &taxes + &adjustments;
        if !withheld.is_zero() {
            builder = builder
                .debit(accounts.receivable_in(&line.currency), withheld)
                .price(rate);
        }
        builder.build().map(Some)
    }

    /// Move a local commission total into the bank-currency commission account
    pub fn create_commission_conversion(
        accounts: &AccountNames,
        date: NaiveDate,
        currency: &str,
        commission: &BigDecimal,
        rate: &BigDecimal,
    ) -> LedgerResult<LedgerTransaction> {
        TransactionBuilder::new(date, format!("{} Commission Conversion", currency))
            .debit(accounts.commission.clone(), commission * rate)
            .memo("Commission")
            .credit(accounts.commission_in(currency), commission.clone())
            .memo("Commission")
            .price(rate.clone())
            .build()
    }

    /// Move a local sales total into the bank-currency sales account
    pub fn create_sales_conversion(
        accounts: &AccountNames,
        date: NaiveDate,
        currency: &str,
        sales: &BigDecimal,
        rate: &BigDecimal,
    ) -> LedgerResult<LedgerTransaction> {
        TransactionBuilder::new(date, format!("{} Sales Conversion", currency))
            .debit(accounts.sales_in(currency), sales.clone())
            .price(rate.clone())
            .credit(accounts.sales.clone(), sales * rate)
            .build()
    }
}
