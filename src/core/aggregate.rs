//! Aggregate arithmetic - the totals a user's ledger implies and the signed change each
//! ledger mutation makes to them.
//!
//! Nothing here touches storage. The delta path and the recomputation path both go
//! through [`Totals::apply`], which keeps their arithmetic identical.

use crate::entities::{TransactionType, transaction, user_aggregate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::Neg;

/// Balance, income and expense for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    /// `total_income - total_expense`
    pub balance: Decimal,
    /// Sum of income amounts
    pub total_income: Decimal,
    /// Sum of expense amounts
    pub total_expense: Decimal,
}

impl Totals {
    /// Totals for the given income and expense, with the balance derived from them.
    #[must_use]
    pub fn new(total_income: Decimal, total_expense: Decimal) -> Self {
        Self {
            balance: total_income - total_expense,
            total_income,
            total_expense,
        }
    }

    /// Sums a set of transactions from scratch.
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a transaction::Model>,
    {
        transactions
            .into_iter()
            .fold(Self::default(), |totals, t| {
                totals.apply(Delta::for_add(t.transaction_type, t.amount.get()))
            })
    }

    /// Returns these totals with `delta` added.
    #[must_use]
    pub fn apply(self, delta: Delta) -> Self {
        Self {
            balance: self.balance + delta.balance,
            total_income: self.total_income + delta.income,
            total_expense: self.total_expense + delta.expense,
        }
    }

    /// Whether `balance == total_income - total_expense`.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.balance == self.total_income - self.total_expense
    }
}

impl From<&user_aggregate::Model> for Totals {
    fn from(model: &user_aggregate::Model) -> Self {
        Self {
            balance: model.balance.get(),
            total_income: model.total_income.get(),
            total_expense: model.total_expense.get(),
        }
    }
}

/// A signed change to a user's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delta {
    /// Change to the balance
    pub balance: Decimal,
    /// Change to total income
    pub income: Decimal,
    /// Change to total expense
    pub expense: Decimal,
}

impl Delta {
    /// Builds a delta from its three components.
    #[must_use]
    pub const fn new(balance: Decimal, income: Decimal, expense: Decimal) -> Self {
        Self {
            balance,
            income,
            expense,
        }
    }

    /// The change caused by recording a transaction.
    #[must_use]
    pub fn for_add(transaction_type: TransactionType, amount: Decimal) -> Self {
        let balance = transaction_type.signed(amount);
        match transaction_type {
            TransactionType::Income => Self::new(balance, amount, Decimal::ZERO),
            TransactionType::Expense => Self::new(balance, Decimal::ZERO, amount),
        }
    }

    /// The change caused by removing a transaction; the exact inverse of [`Delta::for_add`].
    #[must_use]
    pub fn for_delete(transaction_type: TransactionType, amount: Decimal) -> Self {
        -Self::for_add(transaction_type, amount)
    }

    /// The change caused by replacing a transaction's amount. The type never changes, so
    /// the difference is applied with the existing sign.
    #[must_use]
    pub fn for_update(
        transaction_type: TransactionType,
        old_amount: Decimal,
        new_amount: Decimal,
    ) -> Self {
        Self::for_add(transaction_type, new_amount - old_amount)
    }

    /// True when applying this delta changes nothing.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.balance.is_zero() && self.income.is_zero() && self.expense.is_zero()
    }
}

impl Neg for Delta {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.balance, -self.income, -self.expense)
    }
}
