//! Demo data
//!
//! Two accounts and one bank, used by the binary when no database is
//! configured and by the test suites.

use rust_decimal::Decimal;

use crate::aggregate::{Account, Bank};
use crate::domain::DomainError;
use crate::store::{AccountStore, BankStore, StoreError};

pub const FIRST_OWNER: &str = "Andrés";
pub const SECOND_OWNER: &str = "John";
pub const BANK_NAME: &str = "El banco financiero";

/// Rows created by [`seed_demo`]
#[derive(Debug, Clone)]
pub struct DemoData {
    pub first: Account,
    pub second: Account,
    pub bank: Bank,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Insert "Andrés" with 1000, "John" with 2000 and a bank with no transfers
pub async fn seed_demo(accounts: &dyn AccountStore, banks: &dyn BankStore) -> Result<DemoData, SeedError> {
    let first = accounts
        .save(Account::new(FIRST_OWNER, Decimal::new(1000, 0))?)
        .await?;
    let second = accounts
        .save(Account::new(SECOND_OWNER, Decimal::new(2000, 0))?)
        .await?;
    let bank = banks.save(Bank::new(BANK_NAME)).await?;

    tracing::info!("Seeded demo accounts for {} and {}", FIRST_OWNER, SECOND_OWNER);

    Ok(DemoData { first, second, bank })
}
