//! Transaction store - durable CRUD over the `transactions` table.
//!
//! Listings are ordered by date descending with ties broken by ascending id, so two
//! transactions recorded in the same instant always come back in insertion order.

use crate::{
    entities::{Transaction, TransactionType, transaction},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Fields of a transaction about to be inserted. The id and date are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Owner
    pub user_id: i64,
    /// Non-negative amount
    pub amount: Decimal,
    /// Income or expense
    pub transaction_type: TransactionType,
    /// Free-text description
    pub description: String,
    /// Income source or expense category
    pub source_or_category: String,
}

/// The mutable fields of a transaction. Owner, type, id and date cannot change.
#[derive(Debug, Clone)]
pub struct TransactionChanges {
    /// Replacement amount
    pub amount: Decimal,
    /// Replacement description
    pub description: String,
    /// Replacement source or category
    pub source_or_category: String,
}

/// Inserts a new transaction stamped with the current time and returns the stored row.
pub async fn insert<C>(db: &C, new: NewTransaction) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let model = transaction::ActiveModel {
        user_id: Set(new.user_id),
        amount: Set(new.amount.into()),
        transaction_type: Set(new.transaction_type),
        description: Set(new.description),
        source_or_category: Set(new.source_or_category),
        date: Set(chrono::Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Overwrites the mutable fields of an existing transaction.
pub async fn update_by_id<C>(
    db: &C,
    transaction_id: i64,
    changes: TransactionChanges,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let existing = find_by_id(db, transaction_id)
        .await?
        .ok_or(Error::TransactionNotFound { transaction_id })?;

    let mut active: transaction::ActiveModel = existing.into();
    active.amount = Set(changes.amount.into());
    active.description = Set(changes.description);
    active.source_or_category = Set(changes.source_or_category);

    active.update(db).await.map_err(Into::into)
}

/// Removes a transaction. Fails with [`Error::TransactionNotFound`] if nothing was deleted.
pub async fn delete_by_id<C>(db: &C, transaction_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Transaction::delete_by_id(transaction_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::TransactionNotFound { transaction_id });
    }
    Ok(())
}

/// Looks up a transaction by id.
pub async fn find_by_id<C>(db: &C, transaction_id: i64) -> Result<Option<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All transactions of one type for a user, newest first.
pub async fn find_by_user_and_type<C>(
    db: &C,
    user_id: i64,
    transaction_type: TransactionType,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::TransactionType.eq(transaction_type))
        .order_by_desc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every transaction for a user, newest first.
pub async fn find_by_user<C>(db: &C, user_id: i64) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
