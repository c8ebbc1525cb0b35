//! Ledger service module
//!
//! Orchestrates account queries and transfers over the injected stores.

mod commands;
mod ledger;
mod locks;


pub use commands::TransferCommand;
pub use ledger::LedgerService;
pub use locks::{LockKey, LockManager, LockRegistry, LockSet, PgAdvisoryLocks};
