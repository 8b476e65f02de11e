use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::command::RequestKind;

/// One row of the request file: `type,id,from,to,amount`.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub id: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<Decimal>,
}

/// Parses ledger requests in CSV format, yielding each row with its line number.
pub struct CsvRequestParser<R> {
    iter: DeserializeRecordsIntoIter<R, Request>,
}

impl<R> CsvRequestParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvRequestParser<R>
where
    R: Read,
{
    type Item = (u64, Result<Request, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_request_kinds() {
        let input = "type, id, from, to, amount
client, C1, Alice, Gold,
wallet, W1, C1, , 10.50
transfer, T1, W1, W2, 3
";
        let rows: Vec<_> = CsvRequestParser::new(input.as_bytes())
            .map(|(line, row)| (line, row.unwrap()))
            .collect();
        assert_eq!(rows.len(), 3);

        let (line, client) = &rows[0];
        assert_eq!(*line, 2);
        assert_eq!(client.kind, RequestKind::Client);
        assert_eq!(client.to.as_deref(), Some("Gold"));
        assert!(client.amount.is_none());

        let (_, wallet) = &rows[1];
        assert!(wallet.to.is_none());
        assert_eq!(wallet.amount, Some(Decimal::new(1050, 2)));

        let (line, transfer) = &rows[2];
        assert_eq!(*line, 4);
        assert_eq!(transfer.kind, RequestKind::Transfer);
        assert_eq!(transfer.from.as_deref(), Some("W1"));
    }

    #[test]
    fn reports_malformed_rows() {
        let input = "type,id,from,to,amount\nrefund,R1,W1,W2,3\n";
        let mut parser = CsvRequestParser::new(input.as_bytes());
        let (_, row) = parser.next().unwrap();
        assert!(row.is_err());
        assert!(parser.next().is_none());
    }
}
