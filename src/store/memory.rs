//! In-memory stores for tests/dev.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::aggregate::{Account, AccountId, Aggregate, Bank, BankId};

use super::{AccountStore, BankStore, StoreError, StoreResult};

/// In-memory store keyed by aggregate id.
///
/// Ids are handed out from a sequence starting at 1 and never reused. Saving
/// an aggregate that carries an id updates the stored row, and fails with
/// `NotFound` when no such row exists. Reads return clones, so callers never
/// alias stored state.
#[derive(Debug)]
pub struct InMemoryStore<A: Aggregate> {
    rows: RwLock<BTreeMap<A::Id, A>>,
    next_id: AtomicI64,
}

pub type InMemoryAccountStore = InMemoryStore<Account>;
pub type InMemoryBankStore = InMemoryStore<Bank>;

impl<A: Aggregate> InMemoryStore<A> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored aggregates
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<A::Id, A>>> {
        self.rows
            .read()
            .map_err(|_| StoreError::Unavailable(format!("{} store lock poisoned", A::aggregate_type())))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<A::Id, A>>> {
        self.rows
            .write()
            .map_err(|_| StoreError::Unavailable(format!("{} store lock poisoned", A::aggregate_type())))
    }

    fn get(&self, id: A::Id) -> StoreResult<Option<A>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn all(&self) -> StoreResult<Vec<A>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn upsert(&self, mut aggregate: A) -> StoreResult<A> {
        let mut rows = self.write()?;

        let id = match aggregate.id() {
            Some(id) if rows.contains_key(&id) => id,
            Some(id) => {
                return Err(StoreError::NotFound {
                    entity: A::aggregate_type(),
                    id: id.into(),
                })
            }
            None => {
                let id = <A::Id as From<i64>>::from(self.next_id.fetch_add(1, Ordering::SeqCst));
                aggregate.assign_id(id);
                id
            }
        };

        rows.insert(id, aggregate.clone());
        tracing::debug!("{} {} saved", A::aggregate_type(), id);

        Ok(aggregate)
    }

    fn remove(&self, id: A::Id) -> StoreResult<()> {
        if self.write()?.remove(&id).is_some() {
            tracing::debug!("{} {} deleted", A::aggregate_type(), id);
        }
        Ok(())
    }
}

impl<A: Aggregate> Default for InMemoryStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore<Account> {
    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        self.all()
    }

    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        self.get(id)
    }

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .read()?
            .values()
            .find(|account| account.owner() == owner)
            .cloned())
    }

    async fn save(&self, account: Account) -> StoreResult<Account> {
        self.upsert(account)
    }

    async fn delete(&self, account: &Account) -> StoreResult<()> {
        let id = account.id().ok_or(StoreError::NotPersisted("Account"))?;
        self.remove(id)
    }

    async fn delete_by_id(&self, id: AccountId) -> StoreResult<()> {
        self.remove(id)
    }
}

#[async_trait]
impl BankStore for InMemoryStore<Bank> {
    async fn find_by_id(&self, id: BankId) -> StoreResult<Option<Bank>> {
        self.get(id)
    }

    async fn save(&self, bank: Bank) -> StoreResult<Bank> {
        self.upsert(bank)
    }
}
