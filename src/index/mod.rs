//! Lookup structures owned by the ledger.
//!
//! [`ClientTree`] owns every client (and through them every wallet), while
//! [`WalletIndex`] only stores handles pointing into the tree.

pub mod client_tree;
pub mod wallet_index;

pub use client_tree::{ClientTree, NodeId};
pub use wallet_index::{WalletIndex, WalletRef};
