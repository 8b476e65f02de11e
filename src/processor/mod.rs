use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    client::ClientId,
    command::LedgerCommandError,
    transaction::{Transaction, TransactionId},
    wallet::{WalletError, WalletId},
};

pub mod ledger;

/// Reasons a transfer is rejected. None of them leave partial state behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("Wallet {0} not found")]
    WalletNotFound(WalletId),
    #[error("No client owns wallet {0}")]
    ClientNotFound(WalletId),
    #[error("Amount {amount} exceeds the transaction limit of {limit}")]
    LimitExceeded { amount: Decimal, limit: Decimal },
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Decimal, required: Decimal },
    #[error("Withdrawal from wallet {wallet_id} failed: {source}")]
    WithdrawalFailed {
        wallet_id: WalletId,
        source: WalletError,
    },
    #[error("Crediting wallet {wallet_id} failed: {source}")]
    CreditOverflow {
        wallet_id: WalletId,
        source: WalletError,
    },
    #[error("Transaction {0} was already committed")]
    DuplicateTransaction(TransactionId),
    #[error("Invalid amount {amount} or commission {commission}")]
    InvalidAmount { amount: Decimal, commission: Decimal },
}

/// Failures of the onboarding operations (clients and wallets).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Client {0} already exists")]
    DuplicateClient(ClientId),
    #[error("Client {0} not found")]
    UnknownClient(ClientId),
    #[error("Wallet {0} already exists")]
    DuplicateWallet(WalletId),
    #[error("Wallet {wallet_id} cannot open with negative balance {balance}")]
    NegativeBalance { wallet_id: WalletId, balance: Decimal },
}

#[derive(Debug, Error)]
pub enum TransactionProcessError {
    #[error(transparent)]
    CommandErr(#[from] LedgerCommandError),
    #[error(transparent)]
    TransferErr(#[from] TransferError),
    #[error(transparent)]
    LedgerErr(#[from] LedgerError),
}

/// Entry point for committing transfers.
///
/// NOTE: only the in memory [`ledger::Ledger`] implements it today, the trait is
/// the seam for swapping in a persistent backend.
pub trait TransactionProcessor {
    /// Validates and commits an already priced transaction.
    fn process_transaction(&mut self, tx: Transaction) -> Result<(), TransferError>;

    /// Prices the transfer with the sender's tier commission and commits it.
    /// Returns the commission charged.
    fn transfer(
        &mut self,
        tx_id: TransactionId,
        sender_wallet_id: &str,
        recipient_wallet_id: &str,
        amount: Decimal,
    ) -> Result<Decimal, TransferError>;
}
