//! Common test utilities
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use bank_ledger::seed::{seed_demo, DemoData};
use bank_ledger::store::{InMemoryAccountStore, InMemoryBankStore};
use bank_ledger::{Account, AccountId, AccountStore, Bank, BankId, BankStore, LedgerService, StoreError, StoreResult};

/// Counts calls and optionally fails the nth save (1-based)
#[derive(Default)]
pub struct Recorder {
    pub finds: AtomicUsize,
    pub saves: AtomicUsize,
    pub deletes: AtomicUsize,
    fail_on_save: Option<usize>,
}

impl Recorder {
    pub fn failing_on_save(n: usize) -> Self {
        Self {
            fail_on_save: Some(n),
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    fn record_save(&self) -> StoreResult<()> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_save == Some(n) {
            return Err(StoreError::Unavailable(format!("injected failure on save {}", n)));
        }
        Ok(())
    }
}

pub struct RecordingAccountStore {
    pub inner: InMemoryAccountStore,
    pub calls: Recorder,
}

impl RecordingAccountStore {
    pub fn new(calls: Recorder) -> Self {
        Self {
            inner: InMemoryAccountStore::new(),
            calls,
        }
    }
}

#[async_trait]
impl AccountStore for RecordingAccountStore {
    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        self.calls.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        self.calls.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Option<Account>> {
        self.calls.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_owner(owner).await
    }

    async fn save(&self, account: Account) -> StoreResult<Account> {
        self.calls.record_save()?;
        self.inner.save(account).await
    }

    async fn delete(&self, account: &Account) -> StoreResult<()> {
        self.calls.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(account).await
    }

    async fn delete_by_id(&self, id: AccountId) -> StoreResult<()> {
        self.calls.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_by_id(id).await
    }
}

pub struct RecordingBankStore {
    pub inner: InMemoryBankStore,
    pub calls: Recorder,
}

impl RecordingBankStore {
    pub fn new(calls: Recorder) -> Self {
        Self {
            inner: InMemoryBankStore::new(),
            calls,
        }
    }
}

#[async_trait]
impl BankStore for RecordingBankStore {
    async fn find_by_id(&self, id: BankId) -> StoreResult<Option<Bank>> {
        self.calls.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn save(&self, bank: Bank) -> StoreResult<Bank> {
        self.calls.record_save()?;
        self.inner.save(bank).await
    }
}

/// Service over recording stores seeded with the demo rows
///
/// Seeding goes straight to the inner stores so the counters start at zero.
pub struct Harness {
    pub service: LedgerService,
    pub accounts: Arc<RecordingAccountStore>,
    pub banks: Arc<RecordingBankStore>,
    pub demo: DemoData,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_recorders(Recorder::default(), Recorder::default()).await
    }

    pub async fn with_recorders(account_calls: Recorder, bank_calls: Recorder) -> Self {
        let accounts = Arc::new(RecordingAccountStore::new(account_calls));
        let banks = Arc::new(RecordingBankStore::new(bank_calls));
        let demo = seed_demo(&accounts.inner, &banks.inner)
            .await
            .expect("Failed to seed demo data");

        let service = LedgerService::new(accounts.clone(), banks.clone());

        Self {
            service,
            accounts,
            banks,
            demo,
        }
    }

    pub fn first_id(&self) -> AccountId {
        bank_ledger::Aggregate::id(&self.demo.first).expect("seeded account has id")
    }

    pub fn second_id(&self) -> AccountId {
        bank_ledger::Aggregate::id(&self.demo.second).expect("seeded account has id")
    }

    pub fn bank_id(&self) -> BankId {
        bank_ledger::Aggregate::id(&self.demo.bank).expect("seeded bank has id")
    }
}

/// Fresh pool on the test database
pub async fn connect_test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB")
}

/// Setup test database - apply the schema and truncate tables
pub async fn setup_test_db() -> PgPool {
    let pool = connect_test_pool().await;

    bank_ledger::db::apply_schema(&pool)
        .await
        .expect("Failed to apply schema");

    // Clean up DB for fresh state
    sqlx::query("TRUNCATE TABLE accounts, banks RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
