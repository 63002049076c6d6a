//! One month of storefront activity turned into ledger tables

use storefront_ledger::{
    MemorySink, Pipeline, PipelineConfig, PipelineInputs, SourceFile, TransactionSequence,
};

const SALES_REPORT: &str = "iTunes Connect - Sales
Start Date\t01/01/2024
End Date\t01/31/2024
Transaction Date\tSettlement Date\tApple Identifier\tSKU\tTitle\tDeveloper Name\tProduct Type Identifier\tCountry of Sale\tQuantity\tPartner Share\tExtended Partner Share\tPartner Share Currency\tCustomer Price\tCustomer Currency
01/12/2024\t01/31/2024\t1001\tapp\tPocket Atlas\tExample Dev\t1F\tDE\t10\t7.00\t70.00\tEUR\t10.00\tEUR
Country Of Sale\tPartner Share Currency\tQuantity
DE\tEUR\t10
";

const STATEMENT: &str = "iTunes Connect - Payments and Financial Reports (February, 2024)

Country or Region (Currency),Units Sold,Earned,Pre-Tax Subtotal,Input Tax,Adjustments,Withholding Tax,Total Owed,Exchange Rate,Proceeds,Bank Account Currency
Euro-Zone (EUR),10,70.00,70.00,0.00,0.00,0.00,70.00,1.08,75.60,USD
,,,,,,,,,,
,,,,,,,,,75.60 USD,
,,,,,,,,,BANK OF EXAMPLE ****1234,
";

const DEPOSITS: &str = "75.60 USD
BANK OF EXAMPLE ****1234
10
Units Sold
March 5, 2024
Transaction ID: 4711
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Storefront Ledger - Settlement Run\n");

    let inputs = PipelineInputs {
        sales_reports: vec![SourceFile::new("S_M_0124.txt", SALES_REPORT)],
        statements: vec![SourceFile::new("financial_report.csv", STATEMENT)],
        deposit_log: Some(SourceFile::new("deposits.txt", DEPOSITS)),
    };

    let outcome =
        Pipeline::new(PipelineConfig::default()).run(&inputs, TransactionSequence::new(1000))?;

    println!("Accounts:");
    for account in &outcome.ledger.accounts {
        println!(
            "  {:<40} {:<10} {}",
            account.full_name,
            account.account_type.as_str(),
            account.symbol
        );
    }

    println!("\nTransactions:");
    for txn in &outcome.ledger.transactions {
        let number = txn.number().unwrap_or_default();
        for entry in &txn.entries {
            println!(
                "  #{} {} {:<38} {:>10} {}",
                number,
                entry.date,
                entry.account,
                entry.amount,
                entry.description
            );
        }
    }

    println!("\nPrices:");
    for price in &outcome.ledger.prices {
        println!(
            "  {} 1 {} = {} {}",
            price.date, price.from_currency, price.rate, price.to_currency
        );
    }

    let integrity = outcome.ledger.validate_integrity();
    println!(
        "\nIntegrity: {} ({} transactions, {} entries)",
        if integrity.is_valid { "ok" } else { "FAILED" },
        integrity.transaction_count,
        integrity.entry_count
    );

    let mut sink = MemorySink::new();
    outcome.ledger.write_to(&mut sink)?;
    println!("Income:Sales balance: {}", sink.balance("Income:Sales"));
    println!("Next transaction number: {}", outcome.sequence.high_water_mark());

    for issue in &outcome.issues {
        println!("warning: {}", issue);
    }

    Ok(())
}
