//! Per-entity locks
//!
//! Transfers touching a common account or bank must not interleave. A caller
//! takes every lock it needs in ascending `LockKey` order so two callers can
//! never wait on each other in a cycle.
//!
//! [`LockRegistry`] serializes callers inside one process. [`PgAdvisoryLocks`]
//! uses PostgreSQL advisory locks so every process sharing the database is
//! serialized as well.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::aggregate::{AccountId, BankId};
use crate::store::{StoreError, StoreResult};

/// Idle entries are pruned once the registry grows past this size
const PRUNE_THRESHOLD: usize = 1024;

/// Lockable entity. Accounts order before banks, then by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Account(AccountId),
    Bank(BankId),
}

impl LockKey {
    /// Key for `pg_advisory_xact_lock(bigint)`: accounts even, banks odd
    fn advisory_key(&self) -> StoreResult<i64> {
        let (id, tag) = match self {
            LockKey::Account(id) => (id.value(), 0),
            LockKey::Bank(id) => (id.value(), 1),
        };
        id.checked_mul(2)
            .and_then(|key| key.checked_add(tag))
            .ok_or_else(|| StoreError::InvalidData(format!("{:?} is out of advisory lock range", self)))
    }
}

fn normalize<I>(keys: I) -> Vec<LockKey>
where
    I: IntoIterator<Item = LockKey>,
{
    let mut keys: Vec<LockKey> = keys.into_iter().collect();
    keys.sort();
    keys.dedup();
    keys
}

enum Held {
    Local(Vec<OwnedMutexGuard<()>>),
    Advisory(Transaction<'static, Postgres>),
}

/// Locks held for the duration of one operation
///
/// Call [`LockSet::release`] when done. Dropping the set also frees local
/// locks at once; advisory locks are then freed when the connection rolls
/// the transaction back.
pub struct LockSet {
    keys: Vec<LockKey>,
    held: Held,
}

impl LockSet {
    /// Keys held, in acquisition order
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }

    pub async fn release(self) -> StoreResult<()> {
        match self.held {
            Held::Local(guards) => drop(guards),
            Held::Advisory(tx) => tx.commit().await?,
        }
        Ok(())
    }
}

impl fmt::Debug for LockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.held {
            Held::Local(_) => "local",
            Held::Advisory(_) => "advisory",
        };
        f.debug_struct("LockSet")
            .field("keys", &self.keys)
            .field("kind", &kind)
            .finish()
    }
}

/// Source of the entity locks the ledger service takes
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Acquire every distinct key, in ascending order
    async fn lock(&self, keys: Vec<LockKey>) -> StoreResult<LockSet>;
}

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire every distinct key, in ascending order
    pub async fn acquire<I>(&self, keys: I) -> LockSet
    where
        I: IntoIterator<Item = LockKey>,
    {
        let keys = normalize(keys);

        let handles: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.lock().await;
            if locks.len() > PRUNE_THRESHOLD {
                // Only the registry references an idle mutex.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            keys.iter()
                .map(|key| Arc::clone(locks.entry(*key).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }

        LockSet {
            keys,
            held: Held::Local(guards),
        }
    }

    /// Number of tracked entities
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[async_trait]
impl LockManager for LockRegistry {
    async fn lock(&self, keys: Vec<LockKey>) -> StoreResult<LockSet> {
        Ok(self.acquire(keys).await)
    }
}

/// Transaction-scoped PostgreSQL advisory locks
///
/// Each lock set holds one connection for as long as the operation runs, and
/// the operation's own queries need more. Give this type its own pool, never
/// the one the stores use, or a full store pool can wait on itself.
#[derive(Debug, Clone)]
pub struct PgAdvisoryLocks {
    pool: PgPool,
}

impl PgAdvisoryLocks {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockManager for PgAdvisoryLocks {
    async fn lock(&self, keys: Vec<LockKey>) -> StoreResult<LockSet> {
        let keys = normalize(keys);
        let advisory = keys
            .iter()
            .map(LockKey::advisory_key)
            .collect::<StoreResult<Vec<i64>>>()?;

        let mut tx = self.pool.begin().await?;
        for key in advisory {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tracing::debug!("Advisory locks taken for {:?}", keys);

        Ok(LockSet {
            keys,
            held: Held::Advisory(tx),
        })
    }
}
