//! Account Aggregate
//!
//! Account is the core entity for managing balances.
//! Debit and credit mutate the in-memory state; persisting it is the caller's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Amount, Balance, DomainError};

use super::Aggregate;

/// The unique identifier of an account
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for AccountId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<AccountId> for i64 {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account Aggregate
///
/// Value equality covers `owner` and `balance` only, so a freshly built
/// expected account compares equal to its persisted counterpart. Balances
/// compare numerically: `1000` equals `1000.00`.
///
/// Deserialization runs through [`Account::new`], so JSON input obeys the
/// same owner and balance rules as code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AccountData")]
pub struct Account {
    /// Unique account ID, assigned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<AccountId>,

    /// Owner of the account
    owner: String,

    /// Current balance, never negative
    balance: Balance,
}

/// Unchecked wire shape of an [`Account`]
#[derive(Deserialize)]
struct AccountData {
    #[serde(default)]
    id: Option<AccountId>,
    owner: String,
    balance: Decimal,
}

impl TryFrom<AccountData> for Account {
    type Error = DomainError;

    fn try_from(data: AccountData) -> Result<Self, Self::Error> {
        let mut account = Account::new(data.owner, data.balance)?;
        account.id = data.id;
        Ok(account)
    }
}

impl Account {
    /// Create a new, not yet persisted account
    pub fn new(owner: impl Into<String>, balance: Decimal) -> Result<Self, DomainError> {
        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(DomainError::InvalidOwner);
        }

        Ok(Self {
            id: None,
            owner,
            balance: Balance::new(balance)?,
        })
    }

    /// Rebuild an account from stored state
    pub fn from_stored(id: AccountId, owner: String, balance: Decimal) -> Result<Self, DomainError> {
        let mut account = Self::new(owner, balance)?;
        account.id = Some(id);
        Ok(account)
    }

    /// Debit (withdraw) money from the account
    ///
    /// Fails with `InsufficientFunds` and leaves the balance untouched when
    /// the result would be negative.
    pub fn debit(&mut self, amount: &Amount) -> Result<(), DomainError> {
        self.balance = self
            .balance
            .checked_debit(amount)
            .ok_or(DomainError::InsufficientFunds)?;

        Ok(())
    }

    /// Credit (deposit) money to the account
    pub fn credit(&mut self, amount: &Amount) -> Result<(), DomainError> {
        self.balance = self
            .balance
            .checked_credit(amount)
            .ok_or(DomainError::Overflow)?;

        Ok(())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn balance(&self) -> Decimal {
        self.balance.value()
    }

    /// Replace the balance, keeping the non-negative invariant
    pub fn set_balance(&mut self, balance: Decimal) -> Result<(), DomainError> {
        self.balance = Balance::new(balance)?;
        Ok(())
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.balance == other.balance
    }
}

impl Eq for Account {}

impl Aggregate for Account {
    type Id = AccountId;

    fn aggregate_type() -> &'static str {
        "Account"
    }

    fn id(&self) -> Option<AccountId> {
        self.id
    }

    fn assign_id(&mut self, id: AccountId) {
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account() -> Account {
        Account::new("Andres", dec!(1000.12345)).unwrap()
    }

    #[test]
    fn test_account_new() {
        let account = account();

        assert_eq!(account.owner(), "Andres");
        assert_eq!(account.balance(), dec!(1000.12345));
        assert!(account.id().is_none());
        assert!(!account.is_persisted());
        assert!(account.balance() > Decimal::ZERO);
    }

    #[test]
    fn test_account_rejects_blank_owner() {
        assert_eq!(Account::new("  ", dec!(10)), Err(DomainError::InvalidOwner));
    }

    #[test]
    fn test_account_rejects_negative_balance() {
        assert_eq!(
            Account::new("Andres", dec!(-1)),
            Err(DomainError::NegativeBalance(dec!(-1)))
        );
    }

    #[test]
    fn test_account_equality_ignores_id() {
        let a = Account::new("John Doe", dec!(8900.9997)).unwrap();
        let b = Account::from_stored(AccountId::new(7), "John Doe".to_string(), dec!(8900.9997)).unwrap();
        assert_eq!(a, b);

        let c = Account::new("John Doe", dec!(8900.9996)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_account_equality_ignores_scale() {
        let plain = Account::new("Andres", dec!(1000)).unwrap();
        let scaled = Account::new("Andres", dec!(1000.00)).unwrap();

        assert_eq!(plain, scaled);
        // scale is still kept for display
        assert_eq!(scaled.balance().to_string(), "1000.00");
    }

    #[test]
    fn test_account_deserialize() {
        let account: Account = serde_json::from_str(r#"{"id":3,"owner":"Pepe","balance":"3000.50"}"#).unwrap();

        assert_eq!(account.id(), Some(AccountId::new(3)));
        assert_eq!(account.owner(), "Pepe");
        assert_eq!(account.balance(), dec!(3000.50));

        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(serde_json::from_str::<Account>(&json).unwrap().id(), Some(AccountId::new(3)));
    }

    #[test]
    fn test_account_deserialize_rejects_invalid_input() {
        let blank = serde_json::from_str::<Account>(r#"{"owner":"","balance":"5"}"#);
        assert!(blank.unwrap_err().to_string().contains("owner"));

        assert!(serde_json::from_str::<Account>(r#"{"owner":"Pepe","balance":"-5"}"#).is_err());
    }

    #[test]
    fn test_account_debit() {
        let mut account = account();
        account.debit(&Amount::from_integer(100).unwrap()).unwrap();

        assert_eq!(account.balance(), dec!(900.12345));
        assert_eq!(account.balance().to_string(), "900.12345");
    }

    #[test]
    fn test_account_credit() {
        let mut account = account();
        account.credit(&Amount::from_integer(100).unwrap()).unwrap();

        assert_eq!(account.balance().to_string(), "1100.12345");
    }

    #[test]
    fn test_account_insufficient_funds() {
        let mut account = account();
        let result = account.debit(&Amount::from_integer(1500).unwrap());

        let err = result.unwrap_err();
        assert_eq!(err, DomainError::InsufficientFunds);
        assert_eq!(err.to_string(), "Insufficient funds");
        assert_eq!(account.balance(), dec!(1000.12345));
    }

    #[test]
    fn test_exact_balance_debit() {
        let mut account = account();
        account.debit(&Amount::new(dec!(1000.12345)).unwrap()).unwrap();

        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_repeated_fractional_debits_are_exact() {
        let mut account = Account::new("Andres", dec!(100)).unwrap();
        let tenth = Amount::new(dec!(0.1)).unwrap();

        for _ in 0..1000 {
            account.credit(&tenth).unwrap();
        }
        assert_eq!(account.balance(), dec!(200));

        for _ in 0..2000 {
            account.debit(&tenth).unwrap();
        }
        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.debit(&tenth), Err(DomainError::InsufficientFunds));
    }

    #[test]
    fn test_transfer_between_accounts() {
        let mut john = Account::new("John Doe", dec!(2500)).unwrap();
        let mut andres = Account::new("Andres", dec!(1500.8989)).unwrap();
        let amount = Amount::from_integer(500).unwrap();

        andres.debit(&amount).unwrap();
        john.credit(&amount).unwrap();

        assert_eq!(andres.balance().to_string(), "1000.8989");
        assert_eq!(john.balance().to_string(), "3000");
    }
}
