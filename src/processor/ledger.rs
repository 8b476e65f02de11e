use rust_decimal::{Decimal, prelude::Zero};
use tracing::{debug, error};

use crate::{
    client::{Client, ClientId, ClientTier},
    command::LedgerCommand,
    index::{ClientTree, WalletIndex, WalletRef},
    transaction::{Transaction, TransactionId},
    transaction_log::{self, TransactionLog},
    wallet::{Wallet, WalletId},
};

use super::{LedgerError, TransactionProcessError, TransactionProcessor, TransferError};

/// In memory ledger. Sole owner and mutator of clients, wallets and the
/// transaction log; the wallet index is updated by the same calls that create
/// or drop wallets.
#[derive(Debug, Default)]
pub struct Ledger {
    clients: ClientTree,
    wallets: WalletIndex,
    transactions: TransactionLog,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_client(
        &mut self,
        id: impl Into<ClientId>,
        name: impl Into<String>,
        tier: ClientTier,
    ) -> Result<(), LedgerError> {
        let id = id.into();
        if self.clients.find_node(&id).is_some() {
            return Err(LedgerError::DuplicateClient(id));
        }
        self.clients.insert(Client::new(id, name.into(), tier));
        Ok(())
    }

    /// Only way to create a wallet: the wallet index is registered here.
    pub fn add_wallet(
        &mut self,
        client_id: &str,
        wallet_id: impl Into<WalletId>,
        balance: Decimal,
    ) -> Result<(), LedgerError> {
        let wallet_id = wallet_id.into();
        if self.wallets.contains(&wallet_id) {
            return Err(LedgerError::DuplicateWallet(wallet_id));
        }
        if balance < Decimal::zero() {
            return Err(LedgerError::NegativeBalance { wallet_id, balance });
        }
        let node = self
            .clients
            .find_node(client_id)
            .ok_or_else(|| LedgerError::UnknownClient(client_id.to_string()))?;
        let client = self
            .clients
            .client_mut(node)
            .ok_or_else(|| LedgerError::UnknownClient(client_id.to_string()))?;
        let slot = client.push_wallet(wallet_id.clone(), balance);
        self.wallets.register(wallet_id, WalletRef { node, slot });
        Ok(())
    }

    /// Drops the client together with its wallets and their index entries.
    pub fn remove_client(&mut self, id: &str) -> Option<Client> {
        let client = self.clients.remove(id)?;
        for wallet in client.wallets() {
            self.wallets.unregister(wallet.id());
        }
        Some(client)
    }

    /// Trusted load path: records a transaction without validating it or
    /// touching balances.
    pub fn append_raw_transaction(
        &mut self,
        id: impl Into<TransactionId>,
        sender_wallet_id: impl Into<WalletId>,
        recipient_wallet_id: impl Into<WalletId>,
        amount: Decimal,
        commission: Decimal,
    ) {
        self.transactions.append(Transaction::transfer(
            id,
            sender_wallet_id,
            recipient_wallet_id,
            amount,
            commission,
        ));
    }

    pub fn execute(&mut self, command: LedgerCommand) -> Result<(), TransactionProcessError> {
        match command {
            LedgerCommand::OpenClient { id, name, tier } => self.create_client(id, name, tier)?,
            LedgerCommand::OpenWallet {
                wallet_id,
                client_id,
                balance,
            } => self.add_wallet(&client_id, wallet_id, balance)?,
            LedgerCommand::Transfer {
                tx_id,
                sender_wallet_id,
                recipient_wallet_id,
                amount,
            } => {
                self.transfer(tx_id, &sender_wallet_id, &recipient_wallet_id, amount)?;
            }
        }
        Ok(())
    }

    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.find(id)
    }

    /// Clients in ascending id order.
    pub fn clients(&self) -> impl Iterator<Item = &Client> + '_ {
        self.clients.iter()
    }

    /// Clients by ascending current total balance.
    pub fn clients_by_balance(&self) -> Vec<&Client> {
        self.clients.ranked_by_balance()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn wallet(&self, id: &str) -> Option<&Wallet> {
        self.clients.wallet(self.wallets.lookup(id)?)
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.find(id)
    }

    /// Committed transactions, oldest first.
    pub fn transactions(&self) -> transaction_log::Iter<'_> {
        self.transactions.iter()
    }

    fn resolve_wallet(&self, wallet_id: &str) -> Result<WalletRef, TransferError> {
        self.wallets
            .lookup(wallet_id)
            .ok_or_else(|| TransferError::WalletNotFound(wallet_id.to_string()))
    }

    fn balance_of(
        &self,
        wallet_ref: WalletRef,
        wallet_id: &str,
    ) -> Result<Decimal, TransferError> {
        self.clients
            .wallet(wallet_ref)
            .map(Wallet::balance)
            .ok_or_else(|| TransferError::WalletNotFound(wallet_id.to_string()))
    }

    /// Pure validation, returns the sender and recipient handles and the
    /// amount to debit from the sender.
    fn validate(
        &self,
        tx: &Transaction,
    ) -> Result<(WalletRef, WalletRef, Decimal), TransferError> {
        let invalid = || TransferError::InvalidAmount {
            amount: tx.amount(),
            commission: tx.commission(),
        };
        if tx.amount() <= Decimal::zero() || tx.commission() < Decimal::zero() {
            return Err(invalid());
        }
        let debit = tx.total_debit().ok_or_else(invalid)?;
        if self.transactions.contains(tx.id()) {
            return Err(TransferError::DuplicateTransaction(tx.id().to_string()));
        }

        let sender = self.resolve_wallet(tx.sender_wallet_id())?;
        let recipient = self.resolve_wallet(tx.recipient_wallet_id())?;

        let sender_client = self
            .clients
            .find_by_wallet(tx.sender_wallet_id())
            .ok_or_else(|| TransferError::ClientNotFound(tx.sender_wallet_id().to_string()))?;

        let limit = sender_client.tier().max_transaction_limit();
        if tx.amount() > limit {
            return Err(TransferError::LimitExceeded {
                amount: tx.amount(),
                limit,
            });
        }

        let balance = self.balance_of(sender, tx.sender_wallet_id())?;
        if balance < debit {
            return Err(TransferError::InsufficientFunds {
                balance,
                required: debit,
            });
        }

        // a wallet paying itself ends lower than it started
        if sender != recipient {
            let recipient_wallet = self.clients.wallet(recipient).ok_or_else(|| {
                TransferError::WalletNotFound(tx.recipient_wallet_id().to_string())
            })?;
            recipient_wallet
                .balance_after_deposit(tx.amount())
                .map_err(|source| TransferError::CreditOverflow {
                    wallet_id: tx.recipient_wallet_id().to_string(),
                    source,
                })?;
        }
        Ok((sender, recipient, debit))
    }

    /// Debit and credit as one step: either both are applied or neither is.
    fn settle(
        &mut self,
        tx: &Transaction,
        sender: WalletRef,
        recipient: WalletRef,
        debit: Decimal,
    ) -> Result<(), TransferError> {
        if self.clients.wallet(recipient).is_none() {
            return Err(TransferError::WalletNotFound(
                tx.recipient_wallet_id().to_string(),
            ));
        }
        let sender_wallet = self
            .clients
            .wallet_mut(sender)
            .ok_or_else(|| TransferError::WalletNotFound(tx.sender_wallet_id().to_string()))?;
        sender_wallet
            .withdraw(debit)
            .map_err(|source| TransferError::WithdrawalFailed {
                wallet_id: tx.sender_wallet_id().to_string(),
                source,
            })?;

        let credited = match self.clients.wallet_mut(recipient) {
            Some(recipient_wallet) => recipient_wallet.deposit(tx.amount()),
            None => Ok(()),
        };
        if let Err(source) = credited {
            // give the debit back, the sender held this balance a moment ago
            if let Some(sender_wallet) = self.clients.wallet_mut(sender) {
                let _ = sender_wallet.deposit(debit);
            }
            return Err(TransferError::CreditOverflow {
                wallet_id: tx.recipient_wallet_id().to_string(),
                source,
            });
        }
        Ok(())
    }
}

impl TransactionProcessor for Ledger {
    fn process_transaction(&mut self, tx: Transaction) -> Result<(), TransferError> {
        let result = self
            .validate(&tx)
            .and_then(|(sender, recipient, debit)| {
                self.settle(&tx, sender, recipient, debit)
            });
        match result {
            Ok(()) => {
                debug!(tx = %tx, "transfer committed");
                self.transactions.append(tx);
                Ok(())
            }
            Err(err @ TransferError::WithdrawalFailed { .. }) => {
                error!(tx = tx.id(), reason = %err, "debit failed after validation passed");
                Err(err)
            }
            Err(err) => {
                debug!(tx = tx.id(), reason = %err, "transfer rejected");
                Err(err)
            }
        }
    }

    fn transfer(
        &mut self,
        tx_id: TransactionId,
        sender_wallet_id: &str,
        recipient_wallet_id: &str,
        amount: Decimal,
    ) -> Result<Decimal, TransferError> {
        let tier = self
            .clients
            .find_by_wallet(sender_wallet_id)
            .map(Client::tier)
            .ok_or_else(|| {
                if self.wallets.contains(sender_wallet_id) {
                    TransferError::ClientNotFound(sender_wallet_id.to_string())
                } else {
                    TransferError::WalletNotFound(sender_wallet_id.to_string())
                }
            })?;
        let commission = tier.commission(amount);
        self.process_transaction(Transaction::transfer(
            tx_id,
            sender_wallet_id,
            recipient_wallet_id,
            amount,
            commission,
        ))?;
        Ok(commission)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use crate::wallet::WalletError;

    use super::*;

    fn dec(value: u32) -> Decimal {
        Decimal::from_u32(value).unwrap()
    }

    /// C1 (Standard) owns W1 with 500, C2 (Standard) owns W2 with 0.
    fn two_clients() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .create_client("C1", "Alice", ClientTier::Standard)
            .unwrap();
        ledger.add_wallet("C1", "W1", dec(500)).unwrap();
        ledger.create_client("C2", "Bob", ClientTier::Standard).unwrap();
        ledger.add_wallet("C2", "W2", dec(0)).unwrap();
        ledger
    }

    fn balance(ledger: &Ledger, wallet_id: &str) -> Decimal {
        ledger.wallet(wallet_id).unwrap().balance()
    }

    #[test]
    fn transfer_burns_commission() {
        let mut ledger = two_clients();
        ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W2", dec(100), dec(5)))
            .unwrap();

        assert_eq!(balance(&ledger, "W1"), dec(395));
        assert_eq!(balance(&ledger, "W2"), dec(100));
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.transaction("T1").unwrap().commission(), dec(5));
    }

    #[test]
    fn funds_are_conserved_minus_commission() {
        let mut ledger = two_clients();
        let before = balance(&ledger, "W1") + balance(&ledger, "W2");
        let commission = ledger
            .transfer("T1".into(), "W1", "W2", Decimal::new(12345, 2))
            .unwrap();
        let after = balance(&ledger, "W1") + balance(&ledger, "W2");
        assert_eq!(after + commission, before);
        // Standard tier: 5%
        assert_eq!(commission, Decimal::new(617250, 5));
    }

    #[test]
    fn limit_exceeded_is_rejected_without_side_effects() {
        let mut ledger = two_clients();
        ledger.add_wallet("C1", "W3", dec(5000)).unwrap();
        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W3", "W2", dec(1500), dec(0)))
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::LimitExceeded {
                amount: dec(1500),
                limit: dec(1000)
            }
        );
        assert_eq!(balance(&ledger, "W3"), dec(5000));
        assert_eq!(balance(&ledger, "W2"), dec(0));
        assert_eq!(ledger.transactions().len(), 0);
    }

    #[test]
    fn insufficient_funds_is_rejected_without_side_effects() {
        let mut ledger = two_clients();
        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W2", dec(400), dec(150)))
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientFunds {
                balance: dec(500),
                required: dec(550)
            }
        );
        assert_eq!(balance(&ledger, "W1"), dec(500));
        assert_eq!(balance(&ledger, "W2"), dec(0));
        assert!(ledger.transaction("T1").is_none());
    }

    #[test]
    fn unknown_wallet_is_rejected() {
        let mut ledger = two_clients();
        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W9", dec(10), dec(0)))
            .unwrap_err();
        assert_eq!(err, TransferError::WalletNotFound("W9".to_string()));
        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W9", "W1", dec(10), dec(0)))
            .unwrap_err();
        assert_eq!(err, TransferError::WalletNotFound("W9".to_string()));
        assert_eq!(ledger.transactions().len(), 0);

        let err = ledger.transfer("T1".into(), "W9", "W1", dec(10)).unwrap_err();
        assert_eq!(err, TransferError::WalletNotFound("W9".to_string()));
    }

    #[test]
    fn invalid_and_duplicate_transactions_are_rejected() {
        let mut ledger = two_clients();
        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W2", dec(0), dec(0)))
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidAmount { .. }));
        let err = ledger
            .process_transaction(Transaction::transfer(
                "T1",
                "W1",
                "W2",
                dec(1),
                Decimal::from_i32(-1).unwrap(),
            ))
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidAmount { .. }));

        ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W2", dec(10), dec(0)))
            .unwrap();
        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W2", dec(10), dec(0)))
            .unwrap_err();
        assert_eq!(err, TransferError::DuplicateTransaction("T1".to_string()));
        assert_eq!(balance(&ledger, "W1"), dec(490));
    }

    #[test]
    fn unrepresentable_debit_is_rejected() {
        let mut ledger = two_clients();
        let err = ledger
            .process_transaction(Transaction::transfer(
                "T1",
                "W1",
                "W2",
                Decimal::ONE,
                Decimal::MAX,
            ))
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidAmount { .. }));
        assert_eq!(balance(&ledger, "W1"), dec(500));
        assert_eq!(balance(&ledger, "W2"), dec(0));
        assert_eq!(ledger.transactions().len(), 0);
    }

    #[test]
    fn overflowing_credit_leaves_both_wallets_untouched() {
        let mut ledger = two_clients();
        ledger.add_wallet("C2", "W3", Decimal::MAX).unwrap();
        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W3", dec(100), dec(0)))
            .unwrap_err();
        assert!(matches!(
            err,
            TransferError::CreditOverflow {
                source: WalletError::Overflow { .. },
                ..
            }
        ));
        assert_eq!(balance(&ledger, "W1"), dec(500));
        assert_eq!(balance(&ledger, "W3"), Decimal::MAX);
        assert_eq!(ledger.transactions().len(), 0);

        // a full wallet can still pay itself, only the commission leaves it
        ledger
            .process_transaction(Transaction::transfer("T2", "W3", "W3", dec(100), dec(5)))
            .unwrap();
        assert_eq!(balance(&ledger, "W3"), Decimal::MAX - dec(5));
    }

    #[test]
    fn transfer_prices_commission_by_sender_tier() {
        let mut ledger = Ledger::new();
        for (id, tier) in [
            ("S", ClientTier::Standard),
            ("P", ClientTier::Platinum),
            ("G", ClientTier::Gold),
        ] {
            ledger.create_client(id, id, tier).unwrap();
            ledger.add_wallet(id, format!("W{id}"), dec(20000)).unwrap();
        }
        ledger.create_client("R", "recipient", ClientTier::Standard).unwrap();
        ledger.add_wallet("R", "WR", dec(0)).unwrap();

        let standard = ledger.transfer("T1".into(), "WS", "WR", dec(1000)).unwrap();
        let platinum = ledger.transfer("T2".into(), "WP", "WR", dec(1000)).unwrap();
        let gold = ledger.transfer("T3".into(), "WG", "WR", dec(1000)).unwrap();
        assert!(gold <= platinum && platinum <= standard);
        assert_eq!(balance(&ledger, "WS"), dec(18950));
        assert_eq!(balance(&ledger, "WG"), dec(18990));
        assert_eq!(balance(&ledger, "WR"), dec(3000));

        // Platinum can go up to 5000, Gold up to 10000
        assert!(ledger.transfer("T4".into(), "WP", "WR", dec(5000)).is_ok());
        assert!(matches!(
            ledger.transfer("T5".into(), "WP", "WR", dec(5001)),
            Err(TransferError::LimitExceeded { .. })
        ));
        assert!(ledger.transfer("T6".into(), "WG", "WR", dec(10000)).is_ok());
    }

    #[test]
    fn transfer_within_the_same_wallet_only_burns_commission() {
        let mut ledger = two_clients();
        ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W1", dec(100), dec(5)))
            .unwrap();
        assert_eq!(balance(&ledger, "W1"), dec(495));
    }

    #[test]
    fn onboarding_errors() {
        let mut ledger = two_clients();
        assert_eq!(
            ledger.create_client("C1", "Again", ClientTier::Gold),
            Err(LedgerError::DuplicateClient("C1".to_string()))
        );
        assert_eq!(
            ledger.add_wallet("C1", "W2", dec(1)),
            Err(LedgerError::DuplicateWallet("W2".to_string()))
        );
        assert_eq!(
            ledger.add_wallet("C9", "W9", dec(1)),
            Err(LedgerError::UnknownClient("C9".to_string()))
        );
        assert!(matches!(
            ledger.add_wallet("C1", "W9", Decimal::from_i32(-1).unwrap()),
            Err(LedgerError::NegativeBalance { .. })
        ));
        assert!(ledger.wallet("W9").is_none());
    }

    #[test]
    fn every_wallet_is_resolvable_through_the_index() {
        let mut ledger = Ledger::new();
        for i in [5, 2, 8, 1, 9, 3] {
            let client_id = format!("C{i}");
            ledger
                .create_client(client_id.clone(), "n", ClientTier::Gold)
                .unwrap();
            ledger
                .add_wallet(&client_id, format!("W{i}a"), dec(i))
                .unwrap();
        }
        // wallets added after the client already sits in the tree
        ledger.add_wallet("C2", "W2b", dec(7)).unwrap();
        ledger.add_wallet("C9", "W9b", dec(1)).unwrap();
        ledger.remove_client("C5").unwrap();

        for client in ledger.clients() {
            for wallet in client.wallets() {
                let found = ledger.wallet(wallet.id()).unwrap();
                assert_eq!(found.owner_id(), client.id());
            }
        }
        assert!(ledger.wallet("W5a").is_none());
        assert_eq!(ledger.client("C2").unwrap().total_balance(), dec(9));
    }

    #[test]
    fn removed_client_wallets_cannot_transact() {
        let mut ledger = two_clients();
        let removed = ledger.remove_client("C2").unwrap();
        assert_eq!(removed.wallets().len(), 1);
        assert!(ledger.remove_client("C2").is_none());

        let err = ledger
            .process_transaction(Transaction::transfer("T1", "W1", "W2", dec(10), dec(0)))
            .unwrap_err();
        assert_eq!(err, TransferError::WalletNotFound("W2".to_string()));

        // a new client can reuse the freed tree slot without picking up stale wallets
        ledger.create_client("C3", "Carol", ClientTier::Gold).unwrap();
        assert!(ledger.wallet("W2").is_none());
        assert!(ledger.client("C3").unwrap().wallets().is_empty());
    }

    #[test]
    fn clients_are_listed_by_id_and_by_balance() {
        let mut ledger = two_clients();
        ledger.create_client("A0", "Zed", ClientTier::Gold).unwrap();
        ledger.add_wallet("A0", "W0", dec(50)).unwrap();

        let by_id: Vec<_> = ledger.clients().map(Client::id).collect();
        assert_eq!(by_id, ["A0", "C1", "C2"]);
        let ranked = |ledger: &Ledger| -> Vec<String> {
            ledger
                .clients_by_balance()
                .into_iter()
                .map(|client| client.id().to_string())
                .collect()
        };
        assert_eq!(ranked(&ledger), ["C2", "A0", "C1"]);

        ledger.transfer("T1".into(), "W1", "W2", dec(200)).unwrap();
        assert_eq!(ranked(&ledger), ["A0", "C2", "C1"]);
        assert_eq!(ledger.client_count(), 3);
    }

    #[test]
    fn raw_transactions_bypass_validation() {
        let mut ledger = two_clients();
        ledger.append_raw_transaction("T1", "W1", "nowhere", dec(99999), dec(0));
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(balance(&ledger, "W1"), dec(500));
    }

    #[test]
    fn execute_runs_commands() {
        let mut ledger = Ledger::new();
        ledger
            .execute(LedgerCommand::OpenClient {
                id: "C1".into(),
                name: "Alice".into(),
                tier: ClientTier::Platinum,
            })
            .unwrap();
        ledger
            .execute(LedgerCommand::OpenWallet {
                wallet_id: "W1".into(),
                client_id: "C1".into(),
                balance: dec(100),
            })
            .unwrap();
        ledger
            .execute(LedgerCommand::Transfer {
                tx_id: "T1".into(),
                sender_wallet_id: "W1".into(),
                recipient_wallet_id: "W1".into(),
                amount: dec(50),
            })
            .unwrap();
        assert_eq!(balance(&ledger, "W1"), dec(99));

        let err = ledger
            .execute(LedgerCommand::OpenWallet {
                wallet_id: "W1".into(),
                client_id: "C1".into(),
                balance: dec(1),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionProcessError::LedgerErr(LedgerError::DuplicateWallet(_))
        ));
    }
}
