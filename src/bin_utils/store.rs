//! Flat-file persistence of the ledger state.
//!
//! Clients file: `id;name;type` followed by the client's `W;walletId;balance` lines.
//! Transactions file: `id;sender;recipient;amount;commission`, in commit order.
//! Amounts are written with two decimal digits.

use std::{
    io::{Read, Write},
    str::FromStr,
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::warn;

use crate::{
    client::ClientTier,
    processor::{LedgerError, ledger::Ledger},
};

const WALLET_TAG: &str = "W";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: wallet record without a preceding client")]
    OrphanWallet { line: u64 },
    #[error("Line {line}: invalid amount `{value}`: {source}")]
    InvalidAmount {
        line: u64,
        value: String,
        source: rust_decimal::Error,
    },
    #[error("Line {line}: {source}")]
    Ledger { line: u64, source: LedgerError },
    #[error("Client id `{0}` clashes with the wallet record tag")]
    ReservedClientId(String),
}

/// Loads clients and their wallets, returns the number of clients read.
///
/// Unknown client types load as Standard.
pub fn load_clients<R: Read>(source: R, ledger: &mut Ledger) -> Result<usize, StoreError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut current_client: Option<String> = None;
    let mut count = 0;
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        let fields = expect_fields(&record, 3)?;

        if fields[0] == WALLET_TAG {
            let client_id = current_client
                .as_deref()
                .ok_or(StoreError::OrphanWallet { line })?;
            let balance = parse_amount(fields[2], line)?;
            ledger
                .add_wallet(client_id, fields[1], balance)
                .map_err(|source| StoreError::Ledger { line, source })?;
        } else {
            let tier = ClientTier::from_str(fields[2]).unwrap_or_else(|err| {
                warn!(line, %err, "loading client as Standard");
                ClientTier::Standard
            });
            ledger
                .create_client(fields[0], fields[1], tier)
                .map_err(|source| StoreError::Ledger { line, source })?;
            current_client = Some(fields[0].to_string());
            count += 1;
        }
    }
    Ok(count)
}

/// Writes clients in ascending id order, each followed by its wallets.
pub fn save_clients<W: Write>(sink: W, ledger: &Ledger) -> Result<(), StoreError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(sink);

    for client in ledger.clients() {
        if client.id() == WALLET_TAG {
            return Err(StoreError::ReservedClientId(client.id().to_string()));
        }
        writer.write_record([client.id(), client.name(), client.tier().as_str()])?;
        for wallet in client.wallets() {
            writer.write_record([
                WALLET_TAG,
                wallet.id(),
                format_amount(wallet.balance()).as_str(),
            ])?;
        }
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Appends stored transactions to the log without re-validating them.
pub fn load_transactions<R: Read>(source: R, ledger: &mut Ledger) -> Result<usize, StoreError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut count = 0;
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        let fields = expect_fields(&record, 5)?;
        ledger.append_raw_transaction(
            fields[0],
            fields[1],
            fields[2],
            parse_amount(fields[3], line)?,
            parse_amount(fields[4], line)?,
        );
        count += 1;
    }
    Ok(count)
}

pub fn save_transactions<W: Write>(sink: W, ledger: &Ledger) -> Result<(), StoreError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(sink);

    for tx in ledger.transactions() {
        writer.write_record([
            tx.id(),
            tx.sender_wallet_id(),
            tx.recipient_wallet_id(),
            format_amount(tx.amount()).as_str(),
            format_amount(tx.commission()).as_str(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

fn expect_fields(record: &StringRecord, expected: usize) -> Result<Vec<&str>, StoreError> {
    if record.len() != expected {
        return Err(StoreError::FieldCount {
            line: line_of(record),
            expected,
            found: record.len(),
        });
    }
    Ok(record.iter().collect())
}

fn parse_amount(value: &str, line: u64) -> Result<Decimal, StoreError> {
    Decimal::from_str(value.trim()).map_err(|source| StoreError::InvalidAmount {
        line,
        value: value.to_string(),
        source,
    })
}
