//! Entity module - Contains the SeaORM entity definitions for the ledger tables.
//! `transactions` holds the immutable-identity ledger rows and `user_aggregates`
//! holds the cached per-user totals derived from them.

pub mod money;
pub mod transaction;
pub mod user_aggregate;

// Re-export specific types to avoid conflicts
pub use money::Money;
pub use transaction::{Entity as Transaction, Model as TransactionModel, TransactionType};
pub use user_aggregate::{Entity as UserAggregate, Model as UserAggregateModel};
