use std::fmt;

use rust_decimal::Decimal;

use crate::wallet::WalletId;

pub type TransactionId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionKind {
    #[default]
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Transfer => f.write_str("Transfer"),
        }
    }
}

/// Value transfer between two wallets. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: TransactionId,
    sender_wallet_id: WalletId,
    recipient_wallet_id: WalletId,
    amount: Decimal,
    commission: Decimal,
    kind: TransactionKind,
}

impl Transaction {
    pub fn transfer(
        id: impl Into<TransactionId>,
        sender_wallet_id: impl Into<WalletId>,
        recipient_wallet_id: impl Into<WalletId>,
        amount: Decimal,
        commission: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            sender_wallet_id: sender_wallet_id.into(),
            recipient_wallet_id: recipient_wallet_id.into(),
            amount,
            commission,
            kind: TransactionKind::Transfer,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender_wallet_id(&self) -> &str {
        &self.sender_wallet_id
    }

    pub fn recipient_wallet_id(&self) -> &str {
        &self.recipient_wallet_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn commission(&self) -> Decimal {
        self.commission
    }

    /// What the sender is debited: amount plus commission.
    /// `None` when the sum is not representable.
    pub fn total_debit(&self) -> Option<Decimal> {
        self.amount.checked_add(self.commission)
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: from {} to {}, amount {}, commission {}",
            self.kind,
            self.id,
            self.sender_wallet_id,
            self.recipient_wallet_id,
            self.amount,
            self.commission
        )
    }
}
