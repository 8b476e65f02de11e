use rust_decimal::{Decimal, prelude::Zero};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    client::{ClientId, ClientTier, UnknownTier},
    transaction::TransactionId,
    wallet::WalletId,
};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Client,
    Wallet,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    OpenClient {
        id: ClientId,
        name: String,
        tier: ClientTier,
    },
    OpenWallet {
        wallet_id: WalletId,
        client_id: ClientId,
        balance: Decimal,
    },
    Transfer {
        tx_id: TransactionId,
        sender_wallet_id: WalletId,
        recipient_wallet_id: WalletId,
        amount: Decimal,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerCommandError {
    #[error("Field `{field}` is required for {kind:?}")]
    MissingField {
        kind: RequestKind,
        field: &'static str,
    },
    #[error("Amount must not be negative for {kind:?}")]
    NegativeAmount { kind: RequestKind },
    #[error(transparent)]
    UnknownTier(#[from] UnknownTier),
}

impl LedgerCommand {
    /// Builds a command out of a generic request row.
    ///
    /// `from`/`to` mean name/tier for clients, owner for wallets and
    /// sender/recipient wallets for transfers.
    pub fn parse_command(
        kind: RequestKind,
        id: String,
        from: Option<String>,
        to: Option<String>,
        amount: Option<Decimal>,
    ) -> Result<Self, LedgerCommandError> {
        let required = |value: Option<String>, field| {
            value.ok_or(LedgerCommandError::MissingField { kind, field })
        };
        if amount.is_some_and(|amount| amount < Decimal::zero()) {
            return Err(LedgerCommandError::NegativeAmount { kind });
        }

        match kind {
            RequestKind::Client => Ok(Self::OpenClient {
                id,
                name: required(from, "from")?,
                // the original menu files anything unnamed as Standard
                tier: match to {
                    Some(tier) => tier.parse()?,
                    None => ClientTier::Standard,
                },
            }),
            RequestKind::Wallet => Ok(Self::OpenWallet {
                wallet_id: id,
                client_id: required(from, "from")?,
                balance: amount.unwrap_or_default(),
            }),
            RequestKind::Transfer => Ok(Self::Transfer {
                tx_id: id,
                sender_wallet_id: required(from, "from")?,
                recipient_wallet_id: required(to, "to")?,
                amount: amount.ok_or(LedgerCommandError::MissingField {
                    kind,
                    field: "amount",
                })?,
            }),
        }
    }
}
