//! PostgreSQL stores
//!
//! `sqlx`-backed implementations of the store traits. Schema lives in
//! `migrations/0001_ledger.sql`. Ids always come from the `BIGSERIAL`
//! sequences; saving an entity that has an id only ever updates its row.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::aggregate::{Account, AccountId, Aggregate, Bank, BankId};

use super::{AccountStore, BankStore, StoreError, StoreResult};

type AccountRow = (i64, String, Decimal);
type BankRow = (i64, String, i64);

fn account_from_row((id, owner, balance): AccountRow) -> StoreResult<Account> {
    Ok(Account::from_stored(AccountId::new(id), owner, balance)?)
}

fn bank_from_row((id, name, total_transfers): BankRow) -> StoreResult<Bank> {
    let total_transfers = u64::try_from(total_transfers).map_err(|_| {
        StoreError::InvalidData(format!("bank {} has negative transfer count {}", id, total_transfers))
    })?;
    Ok(Bank::from_stored(BankId::new(id), name, total_transfers))
}

/// Account store backed by the `accounts` table
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, owner, balance FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(account_from_row).collect()
    }

    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, owner, balance FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, owner, balance FROM accounts
            WHERE owner = $1
            "#,
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn save(&self, mut account: Account) -> StoreResult<Account> {
        match account.id() {
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO accounts (owner, balance)
                    VALUES ($1, $2)
                    RETURNING id
                    "#,
                )
                .bind(account.owner())
                .bind(account.balance())
                .fetch_one(&self.pool)
                .await?;

                account.assign_id(AccountId::new(id));
            }
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE accounts
                    SET owner = $2, balance = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id.value())
                .bind(account.owner())
                .bind(account.balance())
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound {
                        entity: Account::aggregate_type(),
                        id: id.value(),
                    });
                }
            }
        }

        Ok(account)
    }

    async fn delete(&self, account: &Account) -> StoreResult<()> {
        let id = account.id().ok_or(StoreError::NotPersisted("Account"))?;
        self.delete_by_id(id).await
    }

    async fn delete_by_id(&self, id: AccountId) -> StoreResult<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Bank store backed by the `banks` table
#[derive(Debug, Clone)]
pub struct PgBankStore {
    pool: PgPool,
}

impl PgBankStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BankStore for PgBankStore {
    async fn find_by_id(&self, id: BankId) -> StoreResult<Option<Bank>> {
        let row: Option<BankRow> = sqlx::query_as(
            r#"
            SELECT id, name, total_transfers FROM banks
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(bank_from_row).transpose()
    }

    async fn save(&self, mut bank: Bank) -> StoreResult<Bank> {
        let total_transfers = i64::try_from(bank.total_transfers())
            .map_err(|_| StoreError::InvalidData("transfer count exceeds BIGINT".to_string()))?;

        match bank.id() {
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO banks (name, total_transfers)
                    VALUES ($1, $2)
                    RETURNING id
                    "#,
                )
                .bind(bank.name())
                .bind(total_transfers)
                .fetch_one(&self.pool)
                .await?;

                bank.assign_id(BankId::new(id));
            }
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE banks
                    SET name = $2, total_transfers = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id.value())
                .bind(bank.name())
                .bind(total_transfers)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound {
                        entity: Bank::aggregate_type(),
                        id: id.value(),
                    });
                }
            }
        }

        Ok(bank)
    }
}
