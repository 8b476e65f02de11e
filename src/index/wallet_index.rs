use std::collections::HashMap;

use crate::{index::NodeId, wallet::WalletId};

/// Non-owning handle to a wallet: the tree node of its owner and the wallet's
/// position among the owner's wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletRef {
    pub node: NodeId,
    pub slot: usize,
}

/// Flat wallet id lookup, kept next to the client tree.
#[derive(Debug, Default)]
pub struct WalletIndex {
    entries: HashMap<WalletId, WalletRef>,
}

impl WalletIndex {
    /// Inserts or overwrites the entry for `wallet_id`.
    pub fn register(&mut self, wallet_id: WalletId, wallet_ref: WalletRef) {
        self.entries.insert(wallet_id, wallet_ref);
    }

    pub fn unregister(&mut self, wallet_id: &str) -> Option<WalletRef> {
        self.entries.remove(wallet_id)
    }

    pub fn lookup(&self, wallet_id: &str) -> Option<WalletRef> {
        self.entries.get(wallet_id).copied()
    }

    pub fn contains(&self, wallet_id: &str) -> bool {
        self.entries.contains_key(wallet_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
