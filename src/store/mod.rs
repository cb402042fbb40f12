//! Persistence contracts for the ledger.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`] so the ledger core can run
//! it against a plain connection for reads or against an open database transaction
//! when a transaction write and an aggregate write must commit together.

/// Per-user cached totals
pub mod aggregates;
/// Transaction rows
pub mod transactions;

pub use transactions::{NewTransaction, TransactionChanges};
