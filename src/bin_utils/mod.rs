//! This module could be a separate crate on its own, to bootstrap [`crate::processor::ledger`]
//! within binary, but for simplicity purposes, I include this module directly in the library.

use std::io::{Read, Write};

use crate::{
    command::LedgerCommand,
    processor::{TransactionProcessError, ledger::Ledger},
};
use anyhow::{Context, Result};
use csv_parser::CsvRequestParser;
use csv_printer::print_clients;
pub mod csv_parser;
pub mod csv_printer;
pub mod store;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, TransactionProcessError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    /// Applies every request to `ledger`, then prints clients ranked by balance.
    pub fn run(mut self, ledger: &mut Ledger) -> Result<()> {
        let parser = CsvRequestParser::new(self.input);

        for (line, row) in parser {
            let row = row.with_context(|| format!("Malformed request at line {line}"))?;
            let result =
                LedgerCommand::parse_command(row.kind, row.id, row.from, row.to, row.amount)
                    .map_err(TransactionProcessError::from)
                    .and_then(|command| ledger.execute(command));
            if let Err(err) = result {
                (self.error_printer)(line, err);
            }
        }

        print_clients(self.output, ledger.clients_by_balance())
    }
}
