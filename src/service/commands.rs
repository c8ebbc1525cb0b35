//! Command definitions
//!
//! Commands represent intentions to change the ledger state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::{AccountId, BankId};

/// Command to move `amount` from one account to another, counted by a bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCommand {
    pub origin_id: AccountId,
    pub destination_id: AccountId,
    pub bank_id: BankId,
    /// Amount to transfer (validated when the transfer runs)
    pub amount: Decimal,
}

impl TransferCommand {
    pub fn new(origin_id: AccountId, destination_id: AccountId, bank_id: BankId, amount: Decimal) -> Self {
        Self {
            origin_id,
            destination_id,
            bank_id,
            amount,
        }
    }
}
