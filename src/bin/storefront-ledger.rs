//! storefront-ledger - Convert storefront reports into ledger import tables.
//!
//! Sales reports (tab-separated) and payment statements (`.csv`) are read in
//! the order given; the accounts, transactions and prices tables are written
//! to the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use storefront_ledger::{
    CsvSink, FileSequenceStore, Pipeline, PipelineConfig, PipelineInputs, SequenceStore,
    TransactionSequence,
};

/// Convert storefront sales reports and payment statements into ledger tables.
#[derive(Parser, Debug)]
#[command(name = "storefront-ledger", version, about)]
struct Args {
    /// Sales reports and payment statements, in processing order.
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Deposit log used to re-date payments to their arrival date.
    #[arg(short, long, value_name = "LOG")]
    payments: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory receiving accounts.csv, transactions.csv and prices.csv.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// File holding the next transaction number.
    #[arg(long, value_name = "FILE")]
    index_file: Option<PathBuf>,

    /// Write the next transaction number back to the index file.
    #[arg(long)]
    save_index: bool,

    /// First transaction number; overrides the index file.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.index_file.is_some() {
        config.index_file = args.index_file.clone();
    }
    if args.save_index {
        config.persist_index = true;
    }

    let mut store = config.index_path().map(FileSequenceStore::new);
    let seed = match (args.seed, &store) {
        (Some(seed), _) => seed,
        (None, Some(store)) => store
            .load()
            .with_context(|| format!("failed to read index {}", store.path().display()))?
            .unwrap_or_default(),
        (None, None) => 0,
    };

    let inputs = PipelineInputs::from_paths(&args.files, args.payments.as_deref())
        .context("failed to read input files")?;
    let outcome = Pipeline::new(config.clone()).run(&inputs, TransactionSequence::new(seed))?;

    for issue in &outcome.issues {
        eprintln!("warning: {issue}");
    }
    for skipped in &outcome.skipped_files {
        eprintln!("warning: ignored unknown file {skipped}");
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;
    let mut sink = CsvSink::new(&args.output_dir);
    outcome
        .ledger
        .write_to(&mut sink)
        .context("failed to write ledger tables")?;

    if config.persist_index {
        let store = store
            .as_mut()
            .context("no index file configured and no config directory available")?;
        store.save(outcome.sequence.high_water_mark())?;
        tracing::info!(
            path = %store.path().display(),
            next = outcome.sequence.high_water_mark(),
            "saved index"
        );
    }

    Ok(())
}
