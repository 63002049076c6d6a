//! # Storefront Ledger
//!
//! Converts an app storefront's monthly sales reports and payment statements
//! into balanced double-entry transactions for a personal-finance ledger.
//!
//! ## Features
//!
//! - **Sales reports**: one balanced transaction per sale, with per-currency totals
//! - **Payment statements**: settlement plus tax and adjustment transactions per batch
//! - **Reconciliation**: ties each sales report to the payment that settled it
//!   and converts its commission and sales into the bank currency
//! - **Deposit log**: re-dates payments to the day the money arrived
//! - **Numbering**: monotonic transaction numbers, persistable across runs
//! - **Sink abstraction**: CSV tables or in-memory rows through [`LedgerSink`]
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_ledger::{
//!     MemorySink, Pipeline, PipelineConfig, PipelineInputs, SourceFile, TransactionSequence,
//! };
//!
//! let inputs = PipelineInputs {
//!     sales_reports: vec![SourceFile::new(
//!         "sales.txt",
//!         "Sales\nStart Date\t01/01/2024\nEnd Date\t01/31/2024\n\
//!          Settlement Date\tTitle\tQuantity\tPartner Share\tPartner Share Currency\tCustomer Price\tCustomer Currency\n\
//!          01/31/2024\tMy App\t1\t0.70\tUSD\t0.99\tUSD\n",
//!     )],
//!     ..Default::default()
//! };
//!
//! let outcome = Pipeline::new(PipelineConfig::default())
//!     .run(&inputs, TransactionSequence::new(1))
//!     .unwrap();
//!
//! let mut sink = MemorySink::new();
//! outcome.ledger.write_to(&mut sink).unwrap();
//! assert_eq!(sink.entries().len(), 3);
//! ```

pub mod config;
pub mod ledger;
pub mod parsers;
pub mod pipeline;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use parsers::*;
pub use pipeline::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use utils::{CsvSink, FileSequenceStore, MemorySequenceStore, MemorySink};
