//! Store module
//!
//! Persistence collaborators consumed by the ledger service, plus the
//! in-memory and PostgreSQL adapters that satisfy them.

mod error;
mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::aggregate::{Account, AccountId, Bank, BankId};

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryAccountStore, InMemoryBankStore, InMemoryStore};
pub use postgres::{PgAccountStore, PgBankStore};

/// Account persistence abstraction.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All accounts, in store-defined order.
    async fn find_all(&self) -> StoreResult<Vec<Account>>;

    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>>;

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Option<Account>>;

    /// Insert or update. Assigns an id to accounts that have none.
    async fn save(&self, account: Account) -> StoreResult<Account>;

    async fn delete(&self, account: &Account) -> StoreResult<()>;

    /// Remove by id. Removing an absent id is not an error.
    async fn delete_by_id(&self, id: AccountId) -> StoreResult<()>;
}

/// Bank persistence abstraction.
#[async_trait]
pub trait BankStore: Send + Sync {
    async fn find_by_id(&self, id: BankId) -> StoreResult<Option<Bank>>;

    /// Insert or update. Assigns an id to banks that have none.
    async fn save(&self, bank: Bank) -> StoreResult<Bank>;
}

#[async_trait]
impl<S> AccountStore for Arc<S>
where
    S: AccountStore + ?Sized,
{
    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        (**self).find_all().await
    }

    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Option<Account>> {
        (**self).find_by_owner(owner).await
    }

    async fn save(&self, account: Account) -> StoreResult<Account> {
        (**self).save(account).await
    }

    async fn delete(&self, account: &Account) -> StoreResult<()> {
        (**self).delete(account).await
    }

    async fn delete_by_id(&self, id: AccountId) -> StoreResult<()> {
        (**self).delete_by_id(id).await
    }
}

#[async_trait]
impl<S> BankStore for Arc<S>
where
    S: BankStore + ?Sized,
{
    async fn find_by_id(&self, id: BankId) -> StoreResult<Option<Bank>> {
        (**self).find_by_id(id).await
    }

    async fn save(&self, bank: Bank) -> StoreResult<Bank> {
        (**self).save(bank).await
    }
}
