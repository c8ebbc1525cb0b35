//! bank_ledger - command line front end to the account ledger
//!
//! Uses PostgreSQL when `DATABASE_URL` is set, otherwise in-memory stores
//! seeded with demo data.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bank_ledger::store::{InMemoryAccountStore, InMemoryBankStore, PgAccountStore, PgBankStore};
use bank_ledger::{
    db, seed, Account, AccountId, BankId, Config, LedgerError, LedgerService, LogFormat, PgAdvisoryLocks,
    TransferCommand,
};

/// Command line interface to the account ledger
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every account
    Accounts,
    /// Show one account
    Show { id: i64 },
    /// Print the balance of an account
    Balance { id: i64 },
    /// Print how many transfers a bank has counted
    Transfers { bank_id: i64 },
    /// Open an account with an initial balance
    Open { owner: String, balance: Decimal },
    /// Delete an account
    Delete { id: i64 },
    /// Move an amount between two accounts
    Transfer {
        origin: i64,
        destination: i64,
        bank: i64,
        amount: Decimal,
    },
}

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bank_ledger=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with((format == LogFormat::Pretty).then(|| {
            tracing_subscriber::fmt::layer().with_writer(std::io::stderr)
        }))
        .with((format == LogFormat::Json).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .init();
}

/// Build the service over PostgreSQL or seeded in-memory stores
///
/// With PostgreSQL, transfers lock through advisory locks on a second pool so
/// concurrent invocations against the same database serialize.
async fn build_service(config: &Config) -> anyhow::Result<(LedgerService, Vec<PgPool>)> {
    match config.database_url.as_deref() {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::connect(config, url).await?;
            db::verify_connection(&pool).await?;
            db::apply_schema(&pool).await?;

            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            let lock_pool = db::connect(config, url).await?;

            let service = LedgerService::new(
                Arc::new(PgAccountStore::new(pool.clone())),
                Arc::new(PgBankStore::new(pool.clone())),
            )
            .with_locks(Arc::new(PgAdvisoryLocks::new(lock_pool.clone())));
            Ok((service, vec![pool, lock_pool]))
        }
        None if config.is_production() => {
            Err(anyhow::anyhow!("DATABASE_URL must be set in production"))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory stores with demo data");
            let accounts = Arc::new(InMemoryAccountStore::new());
            let banks = Arc::new(InMemoryBankStore::new());
            seed::seed_demo(accounts.as_ref(), banks.as_ref()).await?;

            Ok((LedgerService::new(accounts, banks), Vec::new()))
        }
    }
}

async fn run(service: &LedgerService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Accounts => {
            let accounts = service.find_all().await?;
            println!("{}", serde_json::to_string_pretty(&accounts)?);
        }
        Command::Show { id } => {
            let account = service.find_by_id(AccountId::new(id)).await?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        Command::Balance { id } => {
            println!("{}", service.check_balance(AccountId::new(id)).await?);
        }
        Command::Transfers { bank_id } => {
            println!("{}", service.check_total_transfers(BankId::new(bank_id)).await?);
        }
        Command::Open { owner, balance } => {
            let account = service.save(Account::new(owner, balance)?).await?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        Command::Delete { id } => {
            service.delete_by_id(AccountId::new(id)).await?;
        }
        Command::Transfer {
            origin,
            destination,
            bank,
            amount,
        } => {
            let command = TransferCommand::new(
                AccountId::new(origin),
                AccountId::new(destination),
                BankId::new(bank),
                amount,
            );
            service.transfer(command.clone()).await?;

            let confirmation = serde_json::json!({
                "date": chrono::Local::now().date_naive().to_string(),
                "status": "OK",
                "message": "Transfer completed successfully",
                "transaction": command,
            });
            println!("{}", serde_json::to_string_pretty(&confirmation)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let (service, pools) = build_service(&config).await?;
    let result = run(&service, args.command).await;

    if let Err(err) = &result {
        if let Some(LedgerError::Store(store)) = err.downcast_ref::<LedgerError>() {
            if store.is_retryable() {
                tracing::warn!("Store unavailable, the command can be retried: {}", store);
            }
        }
    }

    if !pools.is_empty() {
        for pool in pools {
            pool.close().await;
        }
        tracing::debug!("Database connections closed");
    }

    result
}
