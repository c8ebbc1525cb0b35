//! Aggregate module
//!
//! Ledger entities: accounts holding exact balances and banks counting transfers.

pub mod account;
pub mod bank;

pub use account::{Account, AccountId};
pub use bank::{Bank, BankId};

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Aggregate trait that all persisted entities implement
pub trait Aggregate: Clone + Send + Sync + 'static {
    /// Identifier assigned on first persistence
    type Id: Copy + Ord + Hash + Debug + Display + Send + Sync + From<i64> + Into<i64> + 'static;

    /// Get the aggregate type name (for storage and logs)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID, `None` until persisted
    fn id(&self) -> Option<Self::Id>;

    /// Assign the identifier chosen by the store
    fn assign_id(&mut self, id: Self::Id);

    /// Whether the aggregate has been persisted at least once
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
