//! Validation utilities

use crate::traits::*;
use crate::types::*;

/// Validate that a currency code is a three-letter uppercase ISO code
pub fn validate_currency_code(code: &str) -> LedgerResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(LedgerError::Validation(format!(
            "'{}' is not a three-letter currency code",
            code
        )));
    }
    Ok(())
}

/// Validate that an account name is usable as a colon-separated path
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.split(':').any(|part| part.trim().is_empty()) {
        return Err(LedgerError::Validation(format!(
            "Account name '{}' has an empty component",
            name
        )));
    }

    Ok(())
}

/// Enhanced transaction validator with detailed checks
pub struct EnhancedTransactionValidator;

impl TransactionValidator for EnhancedTransactionValidator {
    fn validate_transaction(&self, transaction: &LedgerTransaction) -> LedgerResult<()> {
        // Basic validation
        DefaultTransactionValidator.validate_transaction(transaction)?;

        for entry in &transaction.entries {
            validate_account_name(&entry.account)?;

            if entry.date != transaction.date {
                return Err(LedgerError::Validation(format!(
                    "Entry for '{}' is dated {} but its transaction is dated {}",
                    entry.account, entry.date, transaction.date
                )));
            }

            if entry.description.trim().is_empty() {
                return Err(LedgerError::Validation(format!(
                    "Entry for '{}' has no description",
                    entry.account
                )));
            }
        }

        // All legs of one transaction carry the same number
        let number = transaction.number();
        if transaction.entries.iter().any(|e| e.number != number) {
            return Err(LedgerError::Validation(
                "Entries of a transaction must share one number".to_string(),
            ));
        }

        Ok(())
    }
}
