//! Bank Aggregate
//!
//! Tracks how many transfers have completed. The counter only ever grows.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Aggregate;

/// The unique identifier of a bank
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(i64);

impl BankId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for BankId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<BankId> for i64 {
    fn from(id: BankId) -> Self {
        id.0
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bank Aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<BankId>,

    name: String,

    #[serde(default)]
    total_transfers: u64,
}

impl Bank {
    /// Create a new bank with a zero transfer counter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            total_transfers: 0,
        }
    }

    /// Rebuild a bank from stored state
    pub fn from_stored(id: BankId, name: String, total_transfers: u64) -> Self {
        Self {
            id: Some(id),
            name,
            total_transfers,
        }
    }

    /// Count one completed transfer
    pub fn record_transfer(&mut self) {
        self.total_transfers += 1;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_transfers(&self) -> u64 {
        self.total_transfers
    }
}

impl Aggregate for Bank {
    type Id = BankId;

    fn aggregate_type() -> &'static str {
        "Bank"
    }

    fn id(&self) -> Option<BankId> {
        self.id
    }

    fn assign_id(&mut self, id: BankId) {
        self.id = Some(id);
    }
}
