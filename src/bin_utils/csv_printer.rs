use std::io::Write;

use anyhow::Context;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::client::Client;

#[derive(Debug, Serialize)]
struct ClientRow<'a> {
    client: &'a str,
    name: &'a str,
    tier: &'static str,
    total: Decimal,
}

impl<'a> From<&'a Client> for ClientRow<'a> {
    fn from(client: &'a Client) -> Self {
        Self {
            client: client.id(),
            name: client.name(),
            tier: client.tier().as_str(),
            total: client.total_balance(),
        }
    }
}

/// Writes `client,name,tier,total` rows in the order given.
pub fn print_clients<'a, W>(
    output: &mut W,
    clients: impl IntoIterator<Item = &'a Client>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for client in clients {
        writer
            .serialize(ClientRow::from(client))
            .with_context(|| format!("Failed to write client {} to CSV", client.id()))?;
    }
    writer.flush().context("Failed to flush CSV writer")
}
