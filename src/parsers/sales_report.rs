//! Per-country sales report reader

use bigdecimal::{BigDecimal, Zero};
use std::collections::BTreeMap;

use super::{parse_decimal, parse_report_date};
use crate::config::AccountNames;
use crate::ledger::{patterns, SaleLine};
use crate::types::*;
use crate::utils::validate_currency_code;

/// First cell of the row that ends the sales rows
pub const SALES_SENTINEL: &str = "Country Of Sale";

pub const SETTLEMENT_DATE: &str = "Settlement Date";
pub const TITLE: &str = "Title";
pub const QUANTITY: &str = "Quantity";
pub const PARTNER_SHARE: &str = "Partner Share";
pub const PARTNER_SHARE_CURRENCY: &str = "Partner Share Currency";
pub const CUSTOMER_PRICE: &str = "Customer Price";
pub const CUSTOMER_CURRENCY: &str = "Customer Currency";

/// Column positions resolved from the header row
struct Columns {
    settlement_date: usize,
    title: usize,
    quantity: usize,
    partner_share: usize,
    partner_share_currency: usize,
    customer_price: usize,
    customer_currency: usize,
}

impl Columns {
    fn resolve(source: &str, header: &[&str]) -> LedgerResult<Self> {
        let find = |column: &str| {
            header
                .iter()
                .position(|name| *name == column)
                .ok_or_else(|| LedgerError::MissingColumn {
                    source_name: source.to_string(),
                    column: column.to_string(),
                })
        };
        Ok(Self {
            settlement_date: find(SETTLEMENT_DATE)?,
            title: find(TITLE)?,
            quantity: find(QUANTITY)?,
            partner_share: find(PARTNER_SHARE)?,
            partner_share_currency: find(PARTNER_SHARE_CURRENCY)?,
            customer_price: find(CUSTOMER_PRICE)?,
            customer_currency: find(CUSTOMER_CURRENCY)?,
        })
    }
}

/// Reads tab-separated sales reports into per-currency totals and per-sale transactions
#[derive(Debug, Clone, Default)]
pub struct SalesReportParser {
    accounts: AccountNames,
}

impl SalesReportParser {
    pub fn new(accounts: AccountNames) -> Self {
        Self { accounts }
    }

    /// Parse one report; `source` names it in diagnostics
    pub fn parse(&self, source: &str, content: &str) -> LedgerResult<SalesReport> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() < 4 {
            return Err(LedgerError::parse(
                source,
                "sales report needs a date range and a header row",
            ));
        }

        let start_date = parse_report_date(header_value(lines[1]), source)?;
        let end_date = parse_report_date(header_value(lines[2]), source)?;
        let header: Vec<&str> = lines[3].split('\t').map(str::trim).collect();
        let columns = Columns::resolve(source, &header)?;

        let mut earned: BTreeMap<String, BigDecimal> = BTreeMap::new();
        let mut sales: BTreeMap<String, BigDecimal> = BTreeMap::new();
        let mut commission: BTreeMap<String, BigDecimal> = BTreeMap::new();
        let mut transactions = Vec::new();

        for (offset, line) in lines[4..].iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<&str> = line.split('\t').map(str::trim).collect();
            if row[0] == SALES_SENTINEL {
                break;
            }

            let context = format!("{} line {}", source, offset + 5);
            let cell = |index: usize| {
                row.get(index)
                    .copied()
                    .ok_or_else(|| LedgerError::parse(context.as_str(), "row is too short"))
            };

            let date = parse_report_date(cell(columns.settlement_date)?, &context)?;
            let title = cell(columns.title)?.to_string();
            let quantity: i64 = cell(columns.quantity)?.parse().map_err(|_| {
                LedgerError::parse(context.as_str(), "quantity is not an integer")
            })?;
            let partner_share = parse_decimal(cell(columns.partner_share)?, &context)?;
            let partner_currency = cell(columns.partner_share_currency)?;
            let customer_price = parse_decimal(cell(columns.customer_price)?, &context)?;
            let customer_currency = cell(columns.customer_currency)?;

            if partner_currency != customer_currency {
                return Err(LedgerError::CurrencyMismatch {
                    source_name: context,
                    partner_currency: partner_currency.to_string(),
                    customer_currency: customer_currency.to_string(),
                });
            }
            validate_currency_code(customer_currency)?;

            let sale = SaleLine {
                date,
                title,
                currency: customer_currency.to_string(),
                customer_total: customer_price.abs() * BigDecimal::from(quantity),
                partner_total: partner_share.abs() * BigDecimal::from(quantity),
            };

            add_to(&mut earned, &sale.currency, &sale.partner_total);
            add_to(&mut sales, &sale.currency, &sale.customer_total);
            add_to(&mut commission, &sale.currency, &sale.commission());
            transactions.push(patterns::create_sale(&self.accounts, &sale)?);
        }

        tracing::info!(
            source,
            sales = transactions.len(),
            currencies = sales.len(),
            "parsed sales report"
        );

        Ok(SalesReport {
            source: source.to_string(),
            start_date,
            end_date,
            earned,
            sales,
            commission,
            transactions,
        })
    }
}

/// Value of a `<label>\t<value>` header line
fn header_value(line: &str) -> &str {
    line.split('\t')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .last()
        .unwrap_or("")
}

fn add_to(totals: &mut BTreeMap<String, BigDecimal>, currency: &str, amount: &BigDecimal) {
    *totals
        .entry(currency.to_string())
        .or_insert_with(BigDecimal::zero) += amount;
}
