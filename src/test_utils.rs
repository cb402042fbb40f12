//! Shared test utilities.
//!
//! Helpers for setting up in-memory databases and seeding users and transactions with
//! sensible defaults.

use crate::{
    config::database::create_tables,
    core::{Ledger, Totals, UpdateStrategy},
    entities::{TransactionType, user_aggregate},
    errors::Result,
    store::{NewTransaction, aggregates},
};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool is pinned to a single connection; every new in-memory connection would
/// otherwise open a separate, empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    create_tables(&db).await?;
    Ok(db)
}

/// An in-memory database without any tables, so every storage access fails.
pub async fn setup_db_without_tables() -> Result<DatabaseConnection> {
    Ok(Database::connect("sqlite::memory:").await?)
}

/// A file-backed `SQLite` database in `dir` with a pool of several connections, so
/// database transactions on different connections can overlap.
pub async fn setup_pooled_file_db(dir: &Path) -> Result<DatabaseConnection> {
    let url = format!("sqlite://{}?mode=rwc", dir.join("ledger.sqlite").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(8)
        .min_connections(8)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Makes every write to `user_aggregates` fail, as a broken aggregate store would.
pub async fn reject_aggregate_writes(db: &DatabaseConnection) -> Result<()> {
    db.execute_unprepared(
        "CREATE TRIGGER reject_aggregate_writes BEFORE UPDATE ON user_aggregates \
         BEGIN SELECT RAISE(ABORT, 'aggregate store unavailable'); END;",
    )
    .await?;
    Ok(())
}

/// Creates the zero aggregate for `user_id`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<user_aggregate::Model> {
    aggregates::create(db, user_id).await
}

/// In-memory database with one registered user.
pub async fn setup_with_user(user_id: i64) -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    create_test_user(&db, user_id).await?;
    Ok(db)
}

/// A new transaction with default description `"Test transaction"` and category `"test"`.
pub fn new_transaction(
    user_id: i64,
    amount: Decimal,
    transaction_type: TransactionType,
) -> NewTransaction {
    NewTransaction {
        user_id,
        amount,
        transaction_type,
        description: "Test transaction".to_string(),
        source_or_category: "test".to_string(),
    }
}

/// A ledger over a fresh in-memory database with one registered user.
pub async fn setup_ledger_with_user(user_id: i64, strategy: UpdateStrategy) -> Result<Ledger> {
    let ledger = Ledger::new(setup_test_db().await?).with_strategy(strategy);
    ledger.register_user(user_id).await?;
    Ok(ledger)
}

/// The cached totals for `user_id`.
pub async fn totals_of(ledger: &Ledger, user_id: i64) -> Result<Totals> {
    Ok(Totals::from(&ledger.get_aggregate(user_id).await?))
}
