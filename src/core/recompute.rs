//! Recomputation strategy - derives a user's totals from the transaction store.
//!
//! This is the ground truth the delta path is checked against. Rebuilding overwrites the
//! cached aggregate with the recomputed totals, so running it twice in a row with no
//! mutation in between leaves the aggregate unchanged.

use crate::{
    core::aggregate::Totals,
    entities::TransactionType,
    errors::Result,
    store::{aggregates, transactions},
};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use tracing::debug;

/// Sums every transaction of `user_id`.
pub async fn recompute_totals<C>(db: &C, user_id: i64) -> Result<Totals>
where
    C: ConnectionTrait,
{
    let ledger = transactions::find_by_user(db, user_id).await?;
    let totals = Totals::from_transactions(&ledger);
    debug!(user_id, transactions = ledger.len(), ?totals, "recomputed totals");
    Ok(totals)
}

/// Recomputes `user_id`'s totals and writes them over the cached aggregate.
///
/// Callers must hold the user's lock and should pass an open database transaction.
pub async fn rebuild<C>(db: &C, user_id: i64) -> Result<Totals>
where
    C: ConnectionTrait,
{
    let totals = recompute_totals(db, user_id).await?;
    aggregates::set_absolute(db, user_id, totals).await?;
    Ok(totals)
}

/// Sum of `user_id`'s income amounts, read from the ledger rather than the cache.
pub async fn calculate_total_income<C>(db: &C, user_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    sum_of_type(db, user_id, TransactionType::Income).await
}

/// Sum of `user_id`'s expense amounts, read from the ledger rather than the cache.
pub async fn calculate_total_expense<C>(db: &C, user_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    sum_of_type(db, user_id, TransactionType::Expense).await
}

/// Income minus expense, read from the ledger rather than the cache.
pub async fn calculate_balance<C>(db: &C, user_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    Ok(recompute_totals(db, user_id).await?.balance)
}

async fn sum_of_type<C>(db: &C, user_id: i64, transaction_type: TransactionType) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    Ok(
        transactions::find_by_user_and_type(db, user_id, transaction_type)
            .await?
            .iter()
            .map(|t| t.amount.get())
            .sum(),
    )
}
