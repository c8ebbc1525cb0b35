//! Error handling module
//!
//! Service-level error type returned by every ledger operation.

use crate::aggregate::{AccountId, BankId};
use crate::domain::DomainError;
use crate::store::StoreError;

/// Ledger-wide Result type
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Write of a transfer that failed after the origin account was already saved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    PersistDestination,
    CountTransfer,
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStage::PersistDestination => write!(f, "persist destination"),
            TransferStage::CountTransfer => write!(f, "count transfer"),
        }
    }
}

/// Ledger error types
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Bank not found: {0}")]
    BankNotFound(BankId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A store write failed after earlier writes of the same transfer landed.
    /// Nothing is rolled back; the caller must reconcile.
    #[error("Transfer partially applied, failed at {stage}: {source}")]
    PartialFailure {
        stage: TransferStage,
        #[source]
        source: StoreError,
    },
}

impl LedgerError {
    /// Check if a referenced account or bank was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound(_) | Self::BankNotFound(_))
    }

    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Self::Domain(DomainError::InsufficientFunds))
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::AccountNotFound(_) | Self::BankNotFound(_) => true,
            Self::Domain(err) => err.is_client_error(),
            _ => false,
        }
    }
}
