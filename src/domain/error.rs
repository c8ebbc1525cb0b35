//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations and domain invariant failures.
/// They are independent of the storage layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A debit would drive the balance below zero
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Invalid amount (zero, negative, or unparseable)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account owner is empty
    #[error("Account owner must not be empty")]
    InvalidOwner,

    /// Opening balance below zero
    #[error("Balance cannot be negative: {0}")]
    NegativeBalance(rust_decimal::Decimal),

    /// Decimal arithmetic overflow
    #[error("Balance overflow")]
    Overflow,

    /// Transfer to same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,
}

impl DomainError {
    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Overflow)
    }
}

impl From<super::AmountError> for DomainError {
    fn from(err: super::AmountError) -> Self {
        match err {
            super::AmountError::Negative(value) => Self::NegativeBalance(value),
            other => Self::InvalidAmount(other.to_string()),
        }
    }
}
