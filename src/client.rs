use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::wallet::{Wallet, WalletId};

pub type ClientId = String;

/// Policy tier of a client, determines commission rate and per-transfer cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClientTier {
    #[default]
    Standard,
    Gold,
    Platinum,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown client tier `{0}`")]
pub struct UnknownTier(pub String);

impl ClientTier {
    /// Fraction of the transferred amount withheld as commission.
    pub fn commission_rate(self) -> Decimal {
        match self {
            ClientTier::Standard => Decimal::new(5, 2),
            ClientTier::Platinum => Decimal::new(2, 2),
            ClientTier::Gold => Decimal::new(1, 2),
        }
    }

    pub fn max_transaction_limit(self) -> Decimal {
        match self {
            ClientTier::Standard => Decimal::new(1000, 0),
            ClientTier::Platinum => Decimal::new(5000, 0),
            ClientTier::Gold => Decimal::new(10000, 0),
        }
    }

    pub fn commission(self, amount: Decimal) -> Decimal {
        amount * self.commission_rate()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClientTier::Standard => "Standard",
            ClientTier::Gold => "Gold",
            ClientTier::Platinum => "Platinum",
        }
    }
}

impl fmt::Display for ClientTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" => Ok(ClientTier::Standard),
            "Gold" => Ok(ClientTier::Gold),
            "Platinum" => Ok(ClientTier::Platinum),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

/// Account holder. Owns its wallets, their lifetime is bound to the client.
#[derive(Debug, Clone)]
pub struct Client {
    id: ClientId,
    name: String,
    tier: ClientTier,
    wallets: Vec<Wallet>,
}

impl Client {
    pub(crate) fn new(id: ClientId, name: String, tier: ClientTier) -> Self {
        Self {
            id,
            name,
            tier,
            wallets: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> ClientTier {
        self.tier
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    /// Sum of current wallet balances, recomputed on every call.
    /// Saturates at [`Decimal::MAX`].
    pub fn total_balance(&self) -> Decimal {
        self.wallets
            .iter()
            .map(Wallet::balance)
            .try_fold(Decimal::ZERO, |total, balance| total.checked_add(balance))
            .unwrap_or(Decimal::MAX)
    }

    pub fn owns_wallet(&self, wallet_id: &str) -> bool {
        self.wallets.iter().any(|w| w.id() == wallet_id)
    }

    /// Returns the slot of the new wallet within [`Client::wallets`].
    pub(crate) fn push_wallet(&mut self, id: WalletId, balance: Decimal) -> usize {
        self.wallets.push(Wallet::new(id, self.id.clone(), balance));
        self.wallets.len() - 1
    }

    pub(crate) fn wallet_at(&self, slot: usize) -> Option<&Wallet> {
        self.wallets.get(slot)
    }

    pub(crate) fn wallet_at_mut(&mut self, slot: usize) -> Option<&mut Wallet> {
        self.wallets.get_mut(slot)
    }
}
