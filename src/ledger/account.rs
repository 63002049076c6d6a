//! Chart of accounts for the generated ledger

use std::collections::BTreeSet;

use crate::config::AccountNames;
use crate::types::*;

fn leaf(full_name: &str) -> &str {
    full_name.rsplit(':').next().unwrap_or(full_name)
}

fn top_level(account_type: AccountType, full_name: &str, symbol: &str) -> AccountRow {
    let name = leaf(full_name).to_string();
    AccountRow {
        account_type,
        full_name: full_name.to_string(),
        description: name.clone(),
        name,
        symbol: symbol.to_string(),
        placeholder: false,
    }
}

fn per_currency(account_type: AccountType, full_name: String, currency: &str) -> AccountRow {
    AccountRow {
        account_type,
        full_name,
        name: currency.to_string(),
        description: String::new(),
        symbol: currency.to_string(),
        placeholder: false,
    }
}

/// Build the accounts table
///
/// The fixed accounts are kept in the bank currency; every observed currency
/// gets its own receivable, commission and sales account.
pub fn create_chart_of_accounts(
    accounts: &AccountNames,
    bank_currency: &str,
    currencies: &BTreeSet<String>,
) -> Vec<AccountRow> {
    let mut chart = vec![
        top_level(AccountType::Receivable, &accounts.receivable, bank_currency),
        top_level(AccountType::Expense, &accounts.adjustment, bank_currency),
        top_level(AccountType::Expense, &accounts.tax, bank_currency),
        top_level(AccountType::Expense, &accounts.commission, bank_currency),
        top_level(AccountType::Income, &accounts.sales, bank_currency),
    ];

    for currency in currencies {
        chart.push(per_currency(
            AccountType::Asset,
            accounts.receivable_in(currency),
            currency,
        ));
        chart.push(per_currency(
            AccountType::Expense,
            accounts.commission_in(currency),
            currency,
        ));
        chart.push(per_currency(
            AccountType::Income,
            accounts.sales_in(currency),
            currency,
        ));
    }

    chart
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_layout() {
        let currencies: BTreeSet<String> = ["USD", "EUR"].iter().map(|c| c.to_string()).collect();
        let chart = create_chart_of_accounts(&AccountNames::default(), "USD", &currencies);

        assert_eq!(chart.len(), 5 + 2 * 3);
        assert_eq!(chart[0].account_type, AccountType::Receivable);
        assert_eq!(chart[0].name, "Accounts Receivable");
        assert_eq!(chart[2].full_name, "Expenses:Taxes:Other Tax");
        assert_eq!(chart[2].name, "Other Tax");
        assert!(chart[..5].iter().all(|row| row.symbol == "USD"));

        // currencies come out sorted
        assert_eq!(chart[5].full_name, "Assets:Accounts Receivable:EUR");
        assert_eq!(chart[5].symbol, "EUR");
        assert_eq!(chart[7].full_name, "Income:Sales:EUR");
        assert_eq!(chart[8].full_name, "Assets:Accounts Receivable:USD");
        assert!(chart.iter().all(|row| !row.placeholder));
    }
}
