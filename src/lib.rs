/// Value holders and their deposit/withdraw rules.
pub mod wallet;

/// Account holders, their wallets and the tier policy (commission, limits).
pub mod client;

pub mod transaction;

/// Committed transfers in commit order.
pub mod transaction_log;

/// Client tree and wallet index, both owned by the ledger.
pub mod index;

/// Ledger commands built from request rows, executed by [`processor::ledger::Ledger`].
pub mod command;

/// Transaction processor interface, plus the in memory ledger.
/// Coordinates validation, balance mutation and logging of transfers.
pub mod processor;

/// Request parsing, report printing and flat-file persistence.
/// Ideally this would be its own crate, but the integration tests use it
/// directly, so it lives here.
pub mod bin_utils;
