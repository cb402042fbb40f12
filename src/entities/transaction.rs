//! Transaction entity - One income or expense event in a user's ledger.
//!
//! Amounts are always stored non-negative; the sign an amount contributes to the
//! balance comes from `transaction_type`. `user_id` and `transaction_type` are fixed
//! at creation time. Types are persisted as `"income"` and `"expense"`.

use super::money::Money;
use crate::errors::Error;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Direction of a transaction
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionType {
    /// Money coming in; adds to the balance
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out; subtracts from the balance
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl TransactionType {
    /// Returns `amount` with the sign this type contributes to a balance.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }

    /// Stable name as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::InvalidArgument {
                message: format!("unknown transaction type '{other}'"),
            }),
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the transaction
    pub user_id: i64,
    /// Non-negative amount
    #[sea_orm(column_type = "Text")]
    pub amount: Money,
    /// Income or expense
    pub transaction_type: TransactionType,
    /// Free-text description
    pub description: String,
    /// Income source or expense category
    pub source_or_category: String,
    /// When the transaction was recorded
    pub date: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user aggregate
    #[sea_orm(
        belongs_to = "super::user_aggregate::Entity",
        from = "Column::UserId",
        to = "super::user_aggregate::Column::UserId"
    )]
    UserAggregate,
}

impl Related<super::user_aggregate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAggregate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
