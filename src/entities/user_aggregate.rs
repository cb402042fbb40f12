//! User aggregate entity - Cached per-user totals.
//!
//! One row per user. `balance == total_income - total_expense` must hold whenever no
//! mutation is in flight, and both totals must match the user's transactions.

use super::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User aggregate database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_aggregates")]
pub struct Model {
    /// Identity of the user, owned by the external identity service
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Income minus expense
    #[sea_orm(column_type = "Text")]
    pub balance: Money,
    /// Sum of all income amounts
    #[sea_orm(column_type = "Text")]
    pub total_income: Money,
    /// Sum of all expense amounts
    #[sea_orm(column_type = "Text")]
    pub total_expense: Money,
    /// Last time the totals were written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `UserAggregate` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
