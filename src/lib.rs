//! bank_ledger Library
//!
//! Account ledger core: exact decimal balances, debit/credit invariants and
//! a two-account transfer counted by a bank.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod domain;
pub mod seed;
pub mod service;
pub mod store;

mod error;

pub use aggregate::{Account, AccountId, Aggregate, Bank, BankId};
pub use config::{Config, ConfigError, LogFormat};
pub use domain::{Amount, AmountError, Balance, DomainError};
pub use error::{LedgerError, LedgerResult, TransferStage};
pub use service::{LedgerService, LockManager, LockRegistry, PgAdvisoryLocks, TransferCommand};
pub use store::{AccountStore, BankStore, StoreError, StoreResult};
