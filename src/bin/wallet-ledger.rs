use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wallet_ledger::{
    bin_utils::{Service, store},
    processor::{TransactionProcessError, ledger::Ledger},
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let usage = "usage: wallet-ledger <clients-file> <transactions-file> [requests.csv]";
    let clients_path = args.next().context(usage)?;
    let transactions_path = args.next().context(usage)?;
    let requests_path = args.next();

    let mut ledger = Ledger::new();
    if Path::new(&clients_path).exists() {
        let file = File::open(&clients_path)
            .with_context(|| format!("Failed to open `{clients_path}`"))?;
        let count = store::load_clients(file, &mut ledger)
            .with_context(|| format!("Failed to load clients from `{clients_path}`"))?;
        info!(count, path = %clients_path, "clients loaded");
    }
    if Path::new(&transactions_path).exists() {
        let file = File::open(&transactions_path)
            .with_context(|| format!("Failed to open `{transactions_path}`"))?;
        let count = store::load_transactions(file, &mut ledger)
            .with_context(|| format!("Failed to load transactions from `{transactions_path}`"))?;
        info!(count, path = %transactions_path, "transactions loaded");
    }

    let input: Box<dyn std::io::Read> = match &requests_path {
        Some(path) => {
            Box::new(File::open(path).with_context(|| format!("Failed to open `{path}`"))?)
        }
        None => Box::new(std::io::empty()),
    };
    let service = Service {
        input,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|line, err| match err {
            TransactionProcessError::CommandErr(err) => {
                warn!(line, "invalid request: {err}")
            }
            // business rejections are expected outcomes, not technical errors
            err => info!(line, reason = %err, "request rejected"),
        }),
    };
    service.run(&mut ledger)?;

    let file = File::create(&clients_path)
        .with_context(|| format!("Failed to create `{clients_path}`"))?;
    store::save_clients(file, &ledger).context("Failed to save clients")?;
    let file = File::create(&transactions_path)
        .with_context(|| format!("Failed to create `{transactions_path}`"))?;
    store::save_transactions(file, &ledger).context("Failed to save transactions")?;
    Ok(())
}
