//! Deposit log reader
//!
//! The log is a copy of the storefront's payments page: one block per payout,
//! blocks separated by blank lines.
//!
//! ```text
//! 22,070.60 USD
//! BANK OF EXAMPLE ****1234
//! 1,204
//! Units Sold
//! April 4, 2024
//! Transaction ID: 123456789
//! ```

use chrono::NaiveDate;

use super::parse_decimal;
use crate::types::*;

const BLOCK_LINES: usize = 6;
const DEPOSIT_DATE_FORMAT: &str = "%B %d, %Y";
const TRANSACTION_ID_PREFIX: &str = "Transaction ID:";

/// Parse every complete block of a deposit log
pub fn parse_deposit_log(content: &str) -> LedgerResult<Vec<DepositRecord>> {
    let mut deposits = Vec::new();
    for (number, block) in blocks(content).iter().enumerate() {
        if block.len() < BLOCK_LINES {
            tracing::warn!(
                block = number + 1,
                lines = block.len(),
                "Skipping incomplete deposit block"
            );
            continue;
        }
        deposits.push(parse_block(block, number + 1)?);
    }
    tracing::info!(deposits = deposits.len(), "parsed deposit log");
    Ok(deposits)
}

fn blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_block(block: &[&str], number: usize) -> LedgerResult<DepositRecord> {
    let context = format!("deposit block {}", number);

    let mut amount_parts = block[0].split_whitespace();
    let amount = parse_decimal(amount_parts.next().unwrap_or(""), &context)?;
    let currency = amount_parts.next().unwrap_or("").to_string();

    let units_sold = block[2]
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| LedgerError::parse(context.as_str(), format!("invalid units '{}'", block[2])))?;

    let deposit_date = NaiveDate::parse_from_str(block[4], DEPOSIT_DATE_FORMAT).map_err(|e| {
        LedgerError::parse(context.as_str(), format!("invalid date '{}': {}", block[4], e))
    })?;

    let transaction_id = block[5]
        .strip_prefix(TRANSACTION_ID_PREFIX)
        .unwrap_or(block[5])
        .trim()
        .to_string();

    Ok(DepositRecord {
        amount,
        currency,
        account_label: block[1].to_string(),
        units_sold,
        deposit_date,
        transaction_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const LOG: &str = "22,070.60 USD
BANK OF EXAMPLE ****1234
1,204
Units Sold
April 4, 2024
Transaction ID: 123456789


90.00 USD
BANK OF EXAMPLE ****1234
12
Units Sold
May 2, 2024
Transaction ID: 987654321
";

    #[test]
    fn test_parses_blocks() {
        let deposits = parse_deposit_log(LOG).unwrap();
        assert_eq!(deposits.len(), 2);

        let first = &deposits[0];
        assert_eq!(first.amount, BigDecimal::from_str("22070.60").unwrap());
        assert_eq!(first.currency, "USD");
        assert_eq!(first.account_label, "BANK OF EXAMPLE ****1234");
        assert_eq!(first.units_sold, 1204);
        assert_eq!(
            first.deposit_date,
            NaiveDate::from_ymd_opt(2024, 4, 4).unwrap()
        );
        assert_eq!(first.transaction_id, "123456789");
        assert_eq!(deposits[1].transaction_id, "987654321");
    }

    #[test]
    fn test_incomplete_block_is_skipped() {
        let log = "10.00 USD\nBANK\n1\n\n90.00 USD\nBANK\n12\nUnits Sold\nMay 2, 2024\nTransaction ID: 1\n";
        let deposits = parse_deposit_log(log).unwrap();
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].amount, BigDecimal::from_str("90.00").unwrap());
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let log = "90.00 USD\nBANK\n12\nUnits Sold\n2024-05-02\nTransaction ID: 1\n";
        let result = parse_deposit_log(log);
        assert!(matches!(result, Err(LedgerError::Parse { .. })));
    }
}
