use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

pub type WalletId = String;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },
    #[error("Balance {balance} cannot take a deposit of {amount}")]
    Overflow { balance: Decimal, amount: Decimal },
}

/// Value holder owned by a single client. Balance never goes below zero.
#[derive(Debug, Clone)]
pub struct Wallet {
    id: WalletId,
    owner_id: String,
    balance: Decimal,
}

impl Wallet {
    /// Callers are expected to pass a non-negative opening balance,
    /// the ledger checks it before creating the wallet.
    pub(crate) fn new(id: WalletId, owner_id: String, balance: Decimal) -> Self {
        Self {
            id,
            owner_id,
            balance,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Non-positive amounts are ignored. Fails without side effect if the
    /// balance cannot represent the result.
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), WalletError> {
        if amount > Decimal::zero() {
            self.balance = self.balance_after_deposit(amount)?;
        }
        Ok(())
    }

    pub fn balance_after_deposit(&self, amount: Decimal) -> Result<Decimal, WalletError> {
        self.balance
            .checked_add(amount)
            .ok_or(WalletError::Overflow {
                balance: self.balance,
                amount,
            })
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), WalletError> {
        if amount <= Decimal::zero() {
            return Err(WalletError::NonPositiveAmount(amount));
        }
        if amount > self.balance {
            return Err(WalletError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}
