//! Aggregate store - the cached per-user totals.
//!
//! `apply_delta` and `set_absolute` are the only writers of the totals. Both should be
//! called inside the database transaction that wrote the corresponding ledger rows.

use crate::{
    core::aggregate::{Delta, Totals},
    entities::{Money, UserAggregate, user_aggregate},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Creates the zero aggregate for a newly registered user.
pub async fn create<C>(db: &C, user_id: i64) -> Result<user_aggregate::Model>
where
    C: ConnectionTrait,
{
    if get_by_user(db, user_id).await?.is_some() {
        return Err(Error::InvalidArgument {
            message: format!("user {user_id} already has an aggregate"),
        });
    }

    let model = user_aggregate::ActiveModel {
        user_id: Set(user_id),
        balance: Set(Money::ZERO),
        total_income: Set(Money::ZERO),
        total_expense: Set(Money::ZERO),
        updated_at: Set(chrono::Utc::now()),
    };

    model.insert(db).await.map_err(Into::into)
}

/// Looks up the aggregate for a user.
pub async fn get_by_user<C>(db: &C, user_id: i64) -> Result<Option<user_aggregate::Model>>
where
    C: ConnectionTrait,
{
    UserAggregate::find_by_id(user_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Ids of every user that has an aggregate, ascending.
pub async fn list_user_ids<C>(db: &C) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    UserAggregate::find()
        .select_only()
        .column(user_aggregate::Column::UserId)
        .order_by_asc(user_aggregate::Column::UserId)
        .into_tuple()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds `delta` to the stored totals.
///
/// The sum is computed in `Decimal` and written back as exact text, so the database never
/// performs the addition itself. Callers must hold the user's
/// lock so the read and the write are not interleaved with another delta.
pub async fn apply_delta<C>(db: &C, user_id: i64, delta: Delta) -> Result<user_aggregate::Model>
where
    C: ConnectionTrait,
{
    let current = get_by_user(db, user_id)
        .await?
        .ok_or(Error::UserNotFound { user_id })?;

    let totals = Totals::from(&current).apply(delta);
    write(db, current, totals).await
}

/// Overwrites the stored totals unconditionally.
pub async fn set_absolute<C>(db: &C, user_id: i64, totals: Totals) -> Result<user_aggregate::Model>
where
    C: ConnectionTrait,
{
    let current = get_by_user(db, user_id)
        .await?
        .ok_or(Error::UserNotFound { user_id })?;

    write(db, current, totals).await
}

async fn write<C>(
    db: &C,
    current: user_aggregate::Model,
    totals: Totals,
) -> Result<user_aggregate::Model>
where
    C: ConnectionTrait,
{
    let mut active: user_aggregate::ActiveModel = current.into();
    active.balance = Set(totals.balance.into());
    active.total_income = Set(totals.total_income.into());
    active.total_expense = Set(totals.total_expense.into());
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}
