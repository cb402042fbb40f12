//! Ledger core - transaction lifecycle operations with aggregate maintenance.
//!
//! Every mutation follows the same shape: validate input before touching storage, take
//! the owning user's lock, open a database transaction, write the transaction row,
//! bring the cached aggregate up to date, commit. If anything fails, or the caller drops
//! the future before the commit, the database transaction is dropped uncommitted and
//! neither write survives.
//!
//! The aggregate is brought up to date by the configured [`UpdateStrategy`]. Delta
//! maintenance is the fast path; recomputation is the ground truth the reconciler
//! checks it against.

use crate::{
    core::{
        aggregate::{Delta, Totals},
        locks::UserLocks,
        reconcile::Reconciler,
        recompute,
    },
    entities::{
        TransactionType,
        money::{AMOUNT_SCALE, MAX_AMOUNT},
        transaction, user_aggregate,
    },
    errors::{Error, Result},
    store::{NewTransaction, TransactionChanges, aggregates, transactions},
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// How the cached aggregate is brought up to date after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Apply the signed change of the mutation to the cached totals
    #[default]
    Delta,
    /// Recompute the totals from the user's full transaction set and overwrite
    Recompute,
}

/// The ledger: transaction CRUD plus aggregate consistency.
///
/// Cloning is cheap and clones share the same per-user locks.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: DatabaseConnection,
    locks: Arc<UserLocks>,
    strategy: UpdateStrategy,
}

impl Ledger {
    /// Creates a ledger over `db` using delta maintenance.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            locks: Arc::new(UserLocks::new()),
            strategy: UpdateStrategy::default(),
        }
    }

    /// Switches the aggregate maintenance strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The active maintenance strategy.
    #[must_use]
    pub const fn strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    /// The underlying connection.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// A reconciler sharing this ledger's connection and locks, so repairs never
    /// interleave with mutations of the same user.
    #[must_use]
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.db.clone(), Arc::clone(&self.locks))
    }

    /// Creates the zero aggregate for a user the identity service has just registered.
    #[instrument(skip(self))]
    pub async fn register_user(&self, user_id: i64) -> Result<user_aggregate::Model> {
        let _guard = self.locks.acquire(user_id).await;
        let aggregate = aggregates::create(&self.db, user_id).await?;
        info!(user_id, "registered user aggregate");
        Ok(aggregate)
    }

    /// The cached aggregate for `user_id`.
    pub async fn get_aggregate(&self, user_id: i64) -> Result<user_aggregate::Model> {
        aggregates::get_by_user(&self.db, user_id)
            .await?
            .ok_or(Error::UserNotFound { user_id })
    }

    /// Records a new transaction and adjusts the owner's aggregate.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] if `amount` is negative, above [`MAX_AMOUNT`] or finer
    ///   than four decimal places, before anything is written
    /// * [`Error::UserNotFound`] if the user has no aggregate
    #[instrument(skip(self, description, source_or_category))]
    pub async fn add_transaction(
        &self,
        user_id: i64,
        amount: Decimal,
        transaction_type: TransactionType,
        description: String,
        source_or_category: String,
    ) -> Result<transaction::Model> {
        validate_amount(amount)?;

        let _guard = self.locks.acquire(user_id).await;
        let txn = self.db.begin().await?;

        if aggregates::get_by_user(&txn, user_id).await?.is_none() {
            return Err(Error::UserNotFound { user_id });
        }

        let created = transactions::insert(
            &txn,
            NewTransaction {
                user_id,
                amount,
                transaction_type,
                description,
                source_or_category,
            },
        )
        .await?;

        self.sync_aggregate(&txn, user_id, Delta::for_add(transaction_type, amount))
            .await?;
        txn.commit().await?;

        info!(transaction_id = created.id, "added transaction");
        Ok(created)
    }

    /// Like [`Ledger::add_transaction`], with the type given as text (`"Income"` or
    /// `"Expense"`, case-insensitive).
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for an unrecognized type, before anything is written.
    pub async fn add_transaction_str(
        &self,
        user_id: i64,
        amount: Decimal,
        transaction_type: &str,
        description: String,
        source_or_category: String,
    ) -> Result<transaction::Model> {
        let transaction_type = transaction_type.parse::<TransactionType>()?;
        self.add_transaction(
            user_id,
            amount,
            transaction_type,
            description,
            source_or_category,
        )
        .await
    }

    /// Replaces a transaction's amount and metadata and adjusts the owner's aggregate by
    /// the difference in amount. Owner, type and date are left untouched.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] if `new_amount` is out of range, before anything is written
    /// * [`Error::TransactionNotFound`] if the transaction does not exist
    #[instrument(skip(self, new_description, new_source_or_category))]
    pub async fn update_transaction(
        &self,
        transaction_id: i64,
        new_amount: Decimal,
        new_description: String,
        new_source_or_category: String,
    ) -> Result<transaction::Model> {
        validate_amount(new_amount)?;

        let user_id = self.owner_of(transaction_id).await?;
        let _guard = self.locks.acquire(user_id).await;
        let txn = self.db.begin().await?;

        // Re-read under the lock; it may have been changed or deleted meanwhile
        let existing = owned_by(&txn, transaction_id, user_id).await?;

        let updated = transactions::update_by_id(
            &txn,
            transaction_id,
            TransactionChanges {
                amount: new_amount,
                description: new_description,
                source_or_category: new_source_or_category,
            },
        )
        .await?;

        let delta =
            Delta::for_update(existing.transaction_type, existing.amount.get(), new_amount);
        self.sync_aggregate(&txn, user_id, delta).await?;
        txn.commit().await?;

        info!(old_amount = %existing.amount, new_amount = %new_amount, "updated transaction");
        Ok(updated)
    }

    /// Removes a transaction and takes back what it contributed to the owner's aggregate.
    ///
    /// # Errors
    /// [`Error::TransactionNotFound`] if the transaction does not exist.
    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, transaction_id: i64) -> Result<()> {
        let user_id = self.owner_of(transaction_id).await?;
        let _guard = self.locks.acquire(user_id).await;
        let txn = self.db.begin().await?;

        let existing = owned_by(&txn, transaction_id, user_id).await?;

        transactions::delete_by_id(&txn, transaction_id).await?;

        let delta = Delta::for_delete(existing.transaction_type, existing.amount.get());
        self.sync_aggregate(&txn, user_id, delta).await?;
        txn.commit().await?;

        info!(user_id, "deleted transaction");
        Ok(())
    }

    /// All of `user_id`'s transactions of one type, newest first.
    pub async fn get_transactions(
        &self,
        user_id: i64,
        transaction_type: TransactionType,
    ) -> Result<Vec<transaction::Model>> {
        transactions::find_by_user_and_type(&self.db, user_id, transaction_type).await
    }

    /// Looks up a single transaction.
    pub async fn get_transaction(&self, transaction_id: i64) -> Result<Option<transaction::Model>> {
        transactions::find_by_id(&self.db, transaction_id).await
    }

    /// Rebuilds `user_id`'s aggregate from the full transaction set, regardless of the
    /// configured strategy, and returns the totals written.
    ///
    /// # Errors
    /// [`Error::UserNotFound`] if the user has no aggregate.
    #[instrument(skip(self))]
    pub async fn recompute(&self, user_id: i64) -> Result<Totals> {
        let _guard = self.locks.acquire(user_id).await;
        let txn = self.db.begin().await?;
        let totals = recompute::rebuild(&txn, user_id).await?;
        txn.commit().await?;
        Ok(totals)
    }

    async fn owner_of(&self, transaction_id: i64) -> Result<i64> {
        transactions::find_by_id(&self.db, transaction_id)
            .await?
            .map(|t| t.user_id)
            .ok_or(Error::TransactionNotFound { transaction_id })
    }

    async fn sync_aggregate(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        delta: Delta,
    ) -> Result<()> {
        match self.strategy {
            UpdateStrategy::Delta if delta.is_zero() => {
                debug!(user_id, "aggregate unchanged");
            }
            UpdateStrategy::Delta => {
                let aggregate = aggregates::apply_delta(txn, user_id, delta).await?;
                debug!(user_id, ?delta, balance = %aggregate.balance, "applied delta");
            }
            UpdateStrategy::Recompute => {
                let totals = recompute::rebuild(txn, user_id).await?;
                debug!(user_id, ?totals, "rebuilt aggregate");
            }
        }
        Ok(())
    }
}

/// The transaction as seen inside `txn`, provided it still belongs to `user_id`.
async fn owned_by(
    txn: &DatabaseTransaction,
    transaction_id: i64,
    user_id: i64,
) -> Result<transaction::Model> {
    transactions::find_by_id(txn, transaction_id)
        .await?
        .filter(|t| t.user_id == user_id)
        .ok_or(Error::TransactionNotFound { transaction_id })
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(Error::negative_amount(amount));
    }
    if amount > MAX_AMOUNT || amount.normalize().scale() > AMOUNT_SCALE {
        return Err(Error::amount_out_of_range(amount));
    }
    Ok(())
}
