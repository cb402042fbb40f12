//! Money column type - a `Decimal` persisted as its exact decimal text.
//!
//! `SeaORM`'s `SQLite` binding sends `Decimal` values as `f64`, which silently rounds
//! anything past 15 significant digits. Storing the canonical string keeps every amount
//! and total exact on every backend.

use rust_decimal::Decimal;
use sea_orm::sea_query::{ArrayType, ColumnType, Value, ValueType, ValueTypeErr};
use sea_orm::{ColIdx, DbErr, QueryResult, TryGetError, TryGetable};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Largest amount a single transaction may carry: 12 integer digits, 4 decimal places.
// 9_999_999_999_999_999 split into 32-bit words (`Decimal::new` is not const).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x6FC0_FFFF, 0x0023_86F2, 0, false, AMOUNT_SCALE);

/// Decimal places kept for amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// A monetary value stored exactly.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The wrapped decimal.
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl PartialEq<Decimal> for Money {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Money> for Value {
    fn from(value: Money) -> Self {
        Self::String(Some(Box::new(value.0.to_string())))
    }
}

impl TryGetable for Money {
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> Result<Self, TryGetError> {
        let text = String::try_get_by(res, index)?;
        Decimal::from_str(&text).map(Self).map_err(|e| {
            TryGetError::DbErr(DbErr::Type(format!(
                "stored amount '{text}' is not a decimal: {e}"
            )))
        })
    }
}

impl ValueType for Money {
    fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
        match v {
            Value::String(Some(text)) => {
                Decimal::from_str(&text).map(Self).map_err(|_| ValueTypeErr)
            }
            _ => Err(ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "Money".to_owned()
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }

    fn column_type() -> ColumnType {
        ColumnType::Text
    }
}
