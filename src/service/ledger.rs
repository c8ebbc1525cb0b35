//! Ledger Service
//!
//! Account queries and the two-account transfer, on top of injected stores.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::aggregate::{Account, AccountId, Aggregate, Bank, BankId};
use crate::domain::{Amount, DomainError};
use crate::error::{LedgerError, LedgerResult, TransferStage};
use crate::store::{AccountStore, BankStore, StoreError};

use super::locks::{LockKey, LockManager, LockRegistry, LockSet};
use super::TransferCommand;

/// Service exposing the ledger operations to a calling layer
///
/// Cloning is cheap; clones share the stores and the lock manager.
#[derive(Clone)]
pub struct LedgerService {
    accounts: Arc<dyn AccountStore>,
    banks: Arc<dyn BankStore>,
    locks: Arc<dyn LockManager>,
}

impl LedgerService {
    /// Service with in-process locking
    pub fn new(accounts: Arc<dyn AccountStore>, banks: Arc<dyn BankStore>) -> Self {
        Self {
            accounts,
            banks,
            locks: Arc::new(LockRegistry::new()),
        }
    }

    /// Replace the lock manager, e.g. with advisory locks when several
    /// processes share one database
    pub fn with_locks(mut self, locks: Arc<dyn LockManager>) -> Self {
        self.locks = locks;
        self
    }

    /// Every account, in store order
    pub async fn find_all(&self) -> LedgerResult<Vec<Account>> {
        Ok(self.accounts.find_all().await?)
    }

    pub async fn find_by_id(&self, id: AccountId) -> LedgerResult<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Persist a new or updated account, returning it with its id
    ///
    /// Updating an account that no longer exists fails with `AccountNotFound`.
    pub async fn save(&self, account: Account) -> LedgerResult<Account> {
        let id = match account.id() {
            Some(id) => id,
            None => return self.save_unlocked(account).await,
        };

        let locks = self.locks.lock(vec![LockKey::Account(id)]).await?;
        let result = self.save_unlocked(account).await.map_err(|err| match err {
            LedgerError::Store(StoreError::NotFound { .. }) => LedgerError::AccountNotFound(id),
            other => other,
        });
        release(locks).await;

        result
    }

    async fn save_unlocked(&self, account: Account) -> LedgerResult<Account> {
        let account = self.accounts.save(account).await?;
        tracing::debug!(
            "Account {:?} saved for {} with balance {}",
            account.id(),
            account.owner(),
            account.balance()
        );

        Ok(account)
    }

    pub async fn delete_by_id(&self, id: AccountId) -> LedgerResult<()> {
        let locks = self.locks.lock(vec![LockKey::Account(id)]).await?;
        let result = self.accounts.delete_by_id(id).await;
        release(locks).await;

        result?;
        tracing::debug!("Account {} deleted", id);

        Ok(())
    }

    /// Current balance of an account
    pub async fn check_balance(&self, id: AccountId) -> LedgerResult<Decimal> {
        Ok(self.find_by_id(id).await?.balance())
    }

    /// Number of transfers a bank has counted
    pub async fn check_total_transfers(&self, bank_id: BankId) -> LedgerResult<u64> {
        Ok(self.load_bank(bank_id).await?.total_transfers())
    }

    /// Execute the transfer command
    ///
    /// Debit validation happens before any write, so a rejected transfer
    /// leaves accounts and bank untouched. Writes are not rolled back: if a
    /// write fails after the origin was saved, the error is
    /// [`LedgerError::PartialFailure`].
    pub async fn transfer(&self, command: TransferCommand) -> LedgerResult<()> {
        let amount = Amount::new(command.amount).map_err(DomainError::from)?;

        if command.origin_id == command.destination_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let locks = self
            .locks
            .lock(vec![
                LockKey::Account(command.origin_id),
                LockKey::Account(command.destination_id),
                LockKey::Bank(command.bank_id),
            ])
            .await?;
        let result = self.transfer_locked(&command, &amount).await;
        release(locks).await;

        result
    }

    async fn transfer_locked(&self, command: &TransferCommand, amount: &Amount) -> LedgerResult<()> {
        let mut origin = self.find_by_id(command.origin_id).await?;
        let mut destination = self.find_by_id(command.destination_id).await?;
        let mut bank = self.load_bank(command.bank_id).await?;

        if let Err(err) = origin.debit(amount) {
            tracing::warn!(
                "Transfer of {} from account {} to {} rejected: {}",
                amount,
                command.origin_id,
                command.destination_id,
                err
            );
            return Err(err.into());
        }
        destination.credit(amount)?;

        self.accounts.save(origin).await?;
        self.accounts
            .save(destination)
            .await
            .map_err(|source| partial_failure(command, TransferStage::PersistDestination, source))?;

        bank.record_transfer();
        let bank = self
            .banks
            .save(bank)
            .await
            .map_err(|source| partial_failure(command, TransferStage::CountTransfer, source))?;

        tracing::info!(
            "Transfer of {} from account {} to {} completed (bank {} total: {})",
            amount,
            command.origin_id,
            command.destination_id,
            command.bank_id,
            bank.total_transfers()
        );

        Ok(())
    }

    async fn load_bank(&self, id: BankId) -> LedgerResult<Bank> {
        self.banks
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::BankNotFound(id))
    }
}

/// Release after the guarded work; the work's own result wins
async fn release(locks: LockSet) {
    let keys = locks.keys().to_vec();
    if let Err(err) = locks.release().await {
        tracing::warn!("Releasing locks {:?} failed: {}", keys, err);
    }
}

fn partial_failure(command: &TransferCommand, stage: TransferStage, source: StoreError) -> LedgerError {
    tracing::error!(
        "Transfer from account {} to {} (bank {}, amount {}) partially applied, failed at {}: {}. Manual reconciliation required",
        command.origin_id,
        command.destination_id,
        command.bank_id,
        command.amount,
        stage,
        source
    );
    LedgerError::PartialFailure { stage, source }
}
