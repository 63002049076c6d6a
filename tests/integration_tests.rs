//! Integration tests for storefront-ledger

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::str::FromStr;
use storefront_ledger::utils::EnhancedTransactionValidator;
use storefront_ledger::{
    CsvSink, FileSequenceStore, LedgerError, MemorySink, Pipeline, PipelineConfig,
    PipelineInputs, ReconciliationIssue, SequenceStore, SourceFile, TransactionSequence,
    TransactionValidator,
};

const REPORT_HEADER: &str = "Transaction Date\tSettlement Date\tApple Identifier\tSKU\tTitle\tDeveloper Name\tProduct Type Identifier\tCountry of Sale\tQuantity\tPartner Share\tExtended Partner Share\tPartner Share Currency\tCustomer Price\tCustomer Currency";

const STATEMENT_COLUMNS: &str = "Country or Region (Currency),Units Sold,Earned,Pre-Tax Subtotal,Input Tax,Adjustments,Withholding Tax,Total Owed,Exchange Rate,Proceeds,Bank Account Currency";

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

/// `(title, quantity, partner share, customer price, currency)` per row
fn sales_report(name: &str, month: u32, rows: &[(&str, i64, &str, &str, &str)]) -> SourceFile {
    let mut lines = vec![
        "iTunes Connect - Sales".to_string(),
        format!("Start Date\t{:02}/01/2024", month),
        format!("End Date\t{:02}/28/2024", month),
        REPORT_HEADER.to_string(),
    ];
    for (title, quantity, share, price, currency) in rows {
        lines.push(format!(
            "{m:02}/10/2024\t{m:02}/28/2024\t1001\tsku\t{title}\tDev\t1F\tXX\t{quantity}\t{share}\t0\t{currency}\t{price}\t{currency}",
            m = month
        ));
    }
    lines.push("Country Of Sale\tPartner Share Currency\tQuantity".to_string());
    SourceFile::new(name, lines.join("\n"))
}

fn statement(name: &str, period: &str, rows: &[&str], summary: &str) -> SourceFile {
    let mut lines = vec![
        format!("iTunes Connect - Payments and Financial Reports ({})", period),
        String::new(),
        STATEMENT_COLUMNS.to_string(),
    ];
    lines.extend(rows.iter().map(|row| row.to_string()));
    lines.push(",,,,,,,,,,".to_string());
    lines.push(format!(",,,,,,,,,{},", summary));
    lines.push(",,,,,,,,,BANK OF EXAMPLE ****1234,".to_string());
    SourceFile::new(name, lines.join("\n"))
}

fn deposit_block(amount: &str, date: &str, id: &str) -> String {
    format!(
        "{} USD\nBANK OF EXAMPLE ****1234\n10\nUnits Sold\n{}\nTransaction ID: {}\n",
        amount, date, id
    )
}

/// A January EUR report paid out in the February statement
fn single_month() -> PipelineInputs {
    PipelineInputs {
        sales_reports: vec![sales_report(
            "S_M_0124.txt",
            1,
            &[("Pocket Atlas", 10, "7.00", "10.00", "EUR")],
        )],
        statements: vec![statement(
            "financial_0224.csv",
            "February, 2024",
            &["Euro-Zone (EUR),10,70.00,70.00,0.00,0.00,0.00,70.00,1.08,75.60,USD"],
            "75.60 USD",
        )],
        deposit_log: None,
    }
}

#[test]
fn test_complete_settlement_workflow() {
    let outcome = Pipeline::default()
        .run(&single_month(), TransactionSequence::new(1))
        .unwrap();

    assert!(outcome.issues.is_empty());
    assert!(outcome.skipped_files.is_empty());
    // sale, settlement, commission conversion, sales conversion
    assert_eq!(outcome.ledger.transactions.len(), 4);
    assert_eq!(outcome.sequence.high_water_mark(), 5);
    assert_eq!(outcome.ledger.bank_currency.as_deref(), Some("USD"));

    let mut sink = MemorySink::new();
    outcome.ledger.write_to(&mut sink).unwrap();

    assert_eq!(sink.entries().len(), 9);
    assert_eq!(sink.balance("Income:Sales:EUR"), dec("0"));
    assert_eq!(sink.balance("Expenses:Commissions:EUR"), dec("0"));
    assert_eq!(sink.balance("Assets:Accounts Receivable:EUR"), dec("0"));
    assert_eq!(sink.balance("Income:Sales"), dec("-108.00"));
    assert_eq!(sink.balance("Expenses:Commissions"), dec("32.40"));
    assert_eq!(sink.balance("Assets:Accounts Receivable"), dec("75.60"));

    let prices = sink.prices();
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0].rate, dec("1.08"));
    assert_eq!(prices[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

    let accounts: Vec<String> = sink.accounts().into_iter().map(|a| a.full_name).collect();
    assert_eq!(
        accounts,
        vec![
            "Assets:Accounts Receivable",
            "Expenses:Adjustment",
            "Expenses:Taxes:Other Tax",
            "Expenses:Commissions",
            "Income:Sales",
            "Assets:Accounts Receivable:EUR",
            "Expenses:Commissions:EUR",
            "Income:Sales:EUR",
        ]
    );

    assert!(outcome.ledger.validate_integrity().is_valid);
    for txn in &outcome.ledger.transactions {
        EnhancedTransactionValidator.validate_transaction(txn).unwrap();
    }
}

#[test]
fn test_every_transaction_balances_and_numbers_are_unique() {
    let mut inputs = single_month();
    inputs.sales_reports.push(sales_report(
        "S_M_0224.txt",
        2,
        &[
            ("Pocket Atlas", 3, "0.70", "0.99", "USD"),
            ("Pocket Atlas", 2, "1.40", "2.00", "GBP"),
            ("Pocket Atlas", -1, "0.70", "0.99", "USD"),
        ],
    ));
    inputs.statements.push(statement(
        "financial_0324.csv",
        "March, 2024",
        &[
            "Americas (USD),2,1.40,1.40,0.00,0.00,0.00,1.40,1.00,1.40,USD",
            "United Kingdom (GBP),2,2.80,2.80,-0.40,-0.10,0.00,2.30,1.25,2.90,USD",
        ],
        "4.30 USD",
    ));

    let outcome = Pipeline::default()
        .run(&inputs, TransactionSequence::new(500))
        .unwrap();
    assert!(outcome.issues.is_empty());

    let mut numbers = BTreeSet::new();
    for txn in &outcome.ledger.transactions {
        assert!(txn.is_balanced(), "imbalance {}", txn.imbalance());
        let number = txn.number().unwrap();
        assert!(number >= 500);
        assert!(numbers.insert(number));
        assert!(txn.entries.iter().all(|e| e.date == txn.date));
    }
    assert_eq!(
        numbers.len() as u64,
        outcome.sequence.high_water_mark() - 500
    );

    let dates: Vec<NaiveDate> = outcome.ledger.transactions.iter().map(|t| t.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    // the GBP tax group is one extra transaction
    let tax_groups = outcome
        .ledger
        .transactions
        .iter()
        .filter(|t| t.entries[0].description == "GBP Taxes and Adjustments")
        .count();
    assert_eq!(tax_groups, 1);
}

#[test]
fn test_report_order_does_not_change_pairing() {
    let january = sales_report("jan.txt", 1, &[("A", 10, "7.00", "10.00", "EUR")]);
    let february = sales_report("feb.txt", 2, &[("A", 20, "7.00", "10.00", "EUR")]);
    let statements = vec![
        statement(
            "feb.csv",
            "February, 2024",
            &["Euro-Zone (EUR),10,70.00,70.00,0.00,0.00,0.00,70.00,1.10,77.00,USD"],
            "77.00 USD",
        ),
        statement(
            "mar.csv",
            "March, 2024",
            &["Euro-Zone (EUR),20,140.00,140.00,0.00,0.00,0.00,140.00,1.10,154.00,USD"],
            "154.00 USD",
        ),
    ];

    for reports in [
        vec![january.clone(), february.clone()],
        vec![february.clone(), january.clone()],
    ] {
        let inputs = PipelineInputs {
            sales_reports: reports,
            statements: statements.clone(),
            deposit_log: None,
        };
        let outcome = Pipeline::default()
            .run(&inputs, TransactionSequence::new(0))
            .unwrap();
        assert!(outcome.issues.is_empty());

        let mut sink = MemorySink::new();
        outcome.ledger.write_to(&mut sink).unwrap();
        assert_eq!(sink.balance("Income:Sales"), dec("-330.00"));
        assert_eq!(sink.balance("Income:Sales:EUR"), dec("0"));
    }
}

#[test]
fn test_ambiguous_reports_keep_their_sales() {
    let inputs = PipelineInputs {
        sales_reports: vec![
            sales_report("jan.txt", 1, &[("A", 10, "7.00", "10.00", "EUR")]),
            sales_report("feb.txt", 2, &[("A", 10, "7.00", "10.00", "EUR")]),
        ],
        statements: vec![
            statement(
                "feb.csv",
                "February, 2024",
                &["Euro-Zone (EUR),10,70.00,70.00,0.00,0.00,0.00,70.00,1.08,75.60,USD"],
                "75.60 USD",
            ),
            statement(
                "mar.csv",
                "March, 2024",
                &["Euro-Zone (EUR),10,70.00,70.00,0.00,0.00,0.00,70.00,1.10,77.00,USD"],
                "77.00 USD",
            ),
        ],
        deposit_log: None,
    };
    let outcome = Pipeline::default()
        .run(&inputs, TransactionSequence::new(0))
        .unwrap();

    assert_eq!(outcome.issues.len(), 2);
    assert!(outcome
        .issues
        .iter()
        .all(|issue| matches!(issue, ReconciliationIssue::Ambiguous { .. })));

    let mut sink = MemorySink::new();
    outcome.ledger.write_to(&mut sink).unwrap();
    // per-sale legs are still there, conversions are not
    assert_eq!(sink.balance("Income:Sales:EUR"), dec("-200.00"));
    assert_eq!(sink.balance("Income:Sales"), dec("0"));
    assert_eq!(outcome.ledger.transactions.len(), 4);
}

#[test]
fn test_deposit_log_redates_batch() {
    let mut inputs = single_month();
    inputs.deposit_log = Some(SourceFile::new(
        "deposits.txt",
        format!(
            "{}\n{}",
            deposit_block("12.00", "March 1, 2024", "1"),
            deposit_block("75.60", "March 5, 2024", "2")
        ),
    ));
    let outcome = Pipeline::default()
        .run(&inputs, TransactionSequence::new(0))
        .unwrap();

    let paid = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let sale_date = NaiveDate::from_ymd_opt(2024, 1, 28).unwrap();
    for txn in &outcome.ledger.transactions {
        if txn.entries[0].description == "Pocket Atlas" {
            assert_eq!(txn.date, sale_date);
        } else {
            assert_eq!(txn.date, paid);
            assert!(txn.entries.iter().all(|e| e.date == paid));
        }
    }
    assert!(outcome.ledger.prices.iter().all(|p| p.date == paid));
}

#[test]
fn test_missing_deposit_aborts_run() {
    let mut inputs = single_month();
    inputs.deposit_log = Some(SourceFile::new(
        "deposits.txt",
        deposit_block("75.61", "March 5, 2024", "1"),
    ));
    let result = Pipeline::default().run(&inputs, TransactionSequence::new(0));
    assert!(matches!(result, Err(LedgerError::UnmatchedDeposit { .. })));
}

#[test]
fn test_second_bank_currency_aborts_run() {
    let mut inputs = single_month();
    inputs.statements.push(statement(
        "financial_yen.csv",
        "February, 2024",
        &["Japan (JPY),1,1000,1000,0,0,0,1000,0.0062,6.20,EUR"],
        "6.20 EUR",
    ));
    let result = Pipeline::default().run(&inputs, TransactionSequence::new(0));
    assert!(matches!(
        result,
        Err(LedgerError::MultipleBankCurrencies { .. })
    ));
}

#[test]
fn test_configured_bank_currency_is_enforced() {
    let config = PipelineConfig::from_json_str(r#"{"bank_currency": "EUR"}"#).unwrap();
    let result = Pipeline::new(config).run(&single_month(), TransactionSequence::new(0));
    assert!(matches!(
        result,
        Err(LedgerError::MultipleBankCurrencies { .. })
    ));
}

#[test]
fn test_custom_account_names() {
    let config = PipelineConfig::from_json_str(
        r#"{"accounts": {"sales": "Income:App Store", "commission": "Expenses:Store Fees"}}"#,
    )
    .unwrap();
    let outcome = Pipeline::new(config)
        .run(&single_month(), TransactionSequence::new(0))
        .unwrap();

    let mut sink = MemorySink::new();
    outcome.ledger.write_to(&mut sink).unwrap();
    assert_eq!(sink.balance("Income:App Store"), dec("-108.00"));
    assert_eq!(sink.balance("Expenses:Store Fees:EUR"), dec("0"));
    assert!(outcome.ledger.validate_integrity().is_valid);
}

#[test]
fn test_rerun_writes_identical_tables() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    for dir in [first.path(), second.path()] {
        let outcome = Pipeline::default()
            .run(&single_month(), TransactionSequence::new(42))
            .unwrap();
        outcome.ledger.write_to(&mut CsvSink::new(dir)).unwrap();
    }

    for table in ["accounts.csv", "transactions.csv", "prices.csv"] {
        let a = std::fs::read_to_string(first.path().join(table)).unwrap();
        let b = std::fs::read_to_string(second.path().join(table)).unwrap();
        assert_eq!(a, b, "{} differs between runs", table);
    }

    let transactions = std::fs::read_to_string(first.path().join("transactions.csv")).unwrap();
    assert!(transactions.starts_with("Date,Account,Amount,Number,Description,Memo,Price"));
    assert!(transactions.contains("01/28/2024"));
}

#[test]
fn test_conversion_rows_carry_short_amounts() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = Pipeline::default()
        .run(&single_month(), TransactionSequence::new(0))
        .unwrap();
    outcome.ledger.write_to(&mut CsvSink::new(dir.path())).unwrap();

    let transactions = std::fs::read_to_string(dir.path().join("transactions.csv")).unwrap();
    let rows: Vec<&str> = transactions.lines().collect();
    for expected in [
        "02/01/2024,Assets:Accounts Receivable,75.60,1,BANK OF EXAMPLE ****1234,,0",
        "02/01/2024,Assets:Accounts Receivable:EUR,-70.00,1,BANK OF EXAMPLE ****1234,,1.08",
        "02/01/2024,Expenses:Commissions,32.4000,2,EUR Commission Conversion,Commission,0",
        "02/01/2024,Expenses:Commissions:EUR,-30.00,2,EUR Commission Conversion,Commission,1.08",
        "02/01/2024,Income:Sales:EUR,100.00,3,EUR Sales Conversion,,1.08",
        "02/01/2024,Income:Sales,-108.0000,3,EUR Sales Conversion,,0",
    ] {
        assert!(rows.contains(&expected), "missing row {}", expected);
    }
}

#[test]
fn test_offsetting_tax_and_adjustment_reach_expenses() {
    let inputs = PipelineInputs {
        statements: vec![statement(
            "financial_0224.csv",
            "February, 2024",
            &["Euro-Zone (EUR),10,100.00,100.00,-5.00,5.00,0.00,100.00,0.90,90.00,USD"],
            "90.00 USD",
        )],
        ..Default::default()
    };
    let outcome = Pipeline::default()
        .run(&inputs, TransactionSequence::new(0))
        .unwrap();

    // settlement plus the tax and adjustment group
    assert_eq!(outcome.ledger.transactions.len(), 2);
    let mut sink = MemorySink::new();
    outcome.ledger.write_to(&mut sink).unwrap();
    assert_eq!(sink.balance("Expenses:Taxes:Other Tax"), dec("4.5"));
    assert_eq!(sink.balance("Expenses:Adjustment"), dec("-4.5"));
    assert!(outcome.ledger.validate_integrity().is_valid);
}

#[test]
fn test_index_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileSequenceStore::new(dir.path().join("index"));
    assert_eq!(store.load().unwrap(), None);

    let first = Pipeline::default()
        .run(&single_month(), TransactionSequence::new(0))
        .unwrap();
    store.save(first.sequence.high_water_mark()).unwrap();

    let seed = store.load().unwrap().unwrap_or_default();
    let second = Pipeline::default()
        .run(&single_month(), TransactionSequence::new(seed))
        .unwrap();

    let first_numbers: BTreeSet<u64> = first
        .ledger
        .transactions
        .iter()
        .filter_map(|t| t.number())
        .collect();
    assert!(second
        .ledger
        .transactions
        .iter()
        .filter_map(|t| t.number())
        .all(|n| !first_numbers.contains(&n)));
    assert_eq!(second.sequence.high_water_mark(), 8);
}
