//! Unified error types for the ledger.
//!
//! Every fallible operation in the crate returns [`Result`]. Validation failures are
//! raised before any write is attempted; database failures abort the surrounding
//! database transaction so no half-applied mutation survives.

use crate::core::reconcile::Drift;
use crate::entities::money::{AMOUNT_SCALE, MAX_AMOUNT};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by ledger, store and reconciliation operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input such as a negative amount or an unknown transaction type
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the input
        message: String,
    },

    /// The referenced user has no aggregate record
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// The missing user
        user_id: i64,
    },

    /// The referenced transaction does not exist
    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound {
        /// The missing transaction
        transaction_id: i64,
    },

    /// The cached aggregate disagrees with a recomputation from the ledger
    #[error(
        "Aggregate drift for user {user_id}: expected balance {}, found {}",
        .drift.expected.balance,
        .drift.actual.balance
    )]
    ConsistencyDrift {
        /// The user whose aggregate drifted
        user_id: i64,
        /// Expected and actual totals
        drift: Box<Drift>,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// The persistence layer failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// An environment variable is set but not valid Unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Builds an [`Error::InvalidArgument`] for a negative amount.
    #[must_use]
    pub fn negative_amount(amount: Decimal) -> Self {
        Self::InvalidArgument {
            message: format!("amount must be non-negative, got {amount}"),
        }
    }

    /// Builds an [`Error::InvalidArgument`] for an amount the ledger cannot hold exactly.
    #[must_use]
    pub fn amount_out_of_range(amount: Decimal) -> Self {
        Self::InvalidArgument {
            message: format!(
                "amount {amount} exceeds {MAX_AMOUNT} or has more than {AMOUNT_SCALE} decimal places"
            ),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
