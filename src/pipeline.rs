//! The ordered conversion run: parse, reconcile, re-date, number

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::ledger::{resolve_bank_currency, Ledger, LedgerBuilder, TransactionSequence};
use crate::parsers::{parse_deposit_log, PaymentParser, SalesReportParser};
use crate::reconciliation::{PaymentLogMatcher, ReconciliationEngine, ReconciliationIssue};
use crate::types::*;

/// An input file already read into memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Shown in diagnostics
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn read(path: &Path) -> LedgerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), content))
    }
}

/// Everything one run consumes, each list in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInputs {
    pub sales_reports: Vec<SourceFile>,
    pub statements: Vec<SourceFile>,
    pub deposit_log: Option<SourceFile>,
}

impl PipelineInputs {
    /// Read and classify input files: `.csv` files are payment statements,
    /// everything else is a sales report
    pub fn from_paths(paths: &[PathBuf], deposit_log: Option<&Path>) -> LedgerResult<Self> {
        let mut inputs = Self::default();
        for path in paths {
            let file = SourceFile::read(path)?;
            if is_statement(path) {
                inputs.statements.push(file);
            } else {
                inputs.sales_reports.push(file);
            }
        }
        inputs.deposit_log = deposit_log.map(SourceFile::read).transpose()?;
        Ok(inputs)
    }
}

fn is_statement(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub ledger: Ledger,
    /// Reports whose conversions could not be emitted
    pub issues: Vec<ReconciliationIssue>,
    /// Statement files that were not recognised
    pub skipped_files: Vec<String>,
    /// Counter after the last emitted transaction, for persistence
    pub sequence: TransactionSequence,
}

/// Runs the whole conversion for one configuration
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert `inputs` into a ledger numbered from `sequence`
    ///
    /// Any fatal condition aborts the run before a ledger exists, so nothing
    /// partial can reach a sink.
    pub fn run(
        &self,
        inputs: &PipelineInputs,
        sequence: TransactionSequence,
    ) -> LedgerResult<PipelineOutcome> {
        let sales_parser = SalesReportParser::new(self.config.accounts.clone());
        let reports = inputs
            .sales_reports
            .iter()
            .map(|file| sales_parser.parse(&file.name, &file.content))
            .collect::<LedgerResult<Vec<_>>>()?;

        let payment_parser = PaymentParser::new(self.config.clone());
        let mut batches = Vec::new();
        let mut skipped_files = Vec::new();
        for file in &inputs.statements {
            match payment_parser.parse(&file.name, &file.content)? {
                Some(parsed) => batches.extend(parsed),
                None => skipped_files.push(file.name.clone()),
            }
        }

        let bank_currency = resolve_bank_currency(&batches, self.config.bank_currency.as_deref())?;

        let engine = ReconciliationEngine::new(self.config.accounts.clone());
        let summary = engine.reconcile(&reports, &mut batches)?;

        if let Some(log) = &inputs.deposit_log {
            let matcher = PaymentLogMatcher::new(parse_deposit_log(&log.content)?);
            matcher.apply(&mut batches)?;
        }

        let mut builder = LedgerBuilder::new(self.config.accounts.clone(), sequence);
        builder.set_bank_currency(bank_currency);
        for report in reports {
            builder.add_report(report)?;
        }
        for batch in batches {
            builder.add_batch(batch)?;
        }
        let (ledger, sequence) = builder.finish();

        tracing::info!(
            matched = summary.matches.len(),
            issues = summary.issues.len(),
            skipped = skipped_files.len(),
            next_number = sequence.high_water_mark(),
            "run complete"
        );

        Ok(PipelineOutcome {
            ledger,
            issues: summary.issues,
            skipped_files,
            sequence,
        })
    }
}
