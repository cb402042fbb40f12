//! Reconciliation - detects and repairs drift between cached aggregates and the ledger.
//!
//! Drift should never happen while every mutation goes through [`Ledger`], but rows can
//! still be written around it (manual fixes, imports, an older deployment) and the
//! reconciler is how that gets noticed. Comparison is exact `Decimal` equality.
//!
//! [`Ledger`]: crate::core::ledger::Ledger

use crate::{
    core::{aggregate::Totals, locks::UserLocks, recompute},
    errors::{Error, Result},
    store::aggregates,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{error, info, instrument, warn};

/// Expected (recomputed) versus actual (cached) totals for a drifted user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drift {
    /// Totals recomputed from the transaction store
    pub expected: Totals,
    /// Totals found in the aggregate store
    pub actual: Totals,
}

/// Outcome of verifying one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The cached aggregate matches the ledger
    Consistent,
    /// The cached aggregate differs from the ledger
    Drifted(Drift),
}

impl Verification {
    /// True for [`Verification::Consistent`].
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// Summary of a sweep over every user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Number of users verified
    pub checked: usize,
    /// Every drift found, by user
    pub drifted: Vec<(i64, Drift)>,
    /// Number of drifted users whose aggregate was overwritten
    pub repaired: usize,
}

/// Verifies and repairs cached aggregates.
#[derive(Debug, Clone)]
pub struct Reconciler {
    db: DatabaseConnection,
    locks: Arc<UserLocks>,
}

impl Reconciler {
    /// Creates a reconciler. Pass the ledger's locks (see
    /// [`Ledger::reconciler`](crate::core::ledger::Ledger::reconciler)) so checks and
    /// repairs never observe a half-finished mutation.
    #[must_use]
    pub fn new(db: DatabaseConnection, locks: Arc<UserLocks>) -> Self {
        Self { db, locks }
    }

    /// Recomputes `user_id`'s totals and compares them with the cached aggregate.
    ///
    /// # Errors
    /// [`Error::UserNotFound`] if the user has no aggregate.
    #[instrument(skip(self))]
    pub async fn verify(&self, user_id: i64) -> Result<Verification> {
        let _guard = self.locks.acquire(user_id).await;
        let txn = self.db.begin().await?;

        let cached = aggregates::get_by_user(&txn, user_id)
            .await?
            .ok_or(Error::UserNotFound { user_id })?;
        let expected = recompute::recompute_totals(&txn, user_id).await?;
        txn.commit().await?;

        let actual = Totals::from(&cached);
        if actual == expected && actual.is_balanced() {
            Ok(Verification::Consistent)
        } else {
            Ok(Verification::Drifted(Drift { expected, actual }))
        }
    }

    /// Like [`Reconciler::verify`], but reports drift as [`Error::ConsistencyDrift`].
    pub async fn ensure_consistent(&self, user_id: i64) -> Result<()> {
        match self.verify(user_id).await? {
            Verification::Consistent => Ok(()),
            Verification::Drifted(drift) => Err(Error::ConsistencyDrift {
                user_id,
                drift: Box::new(drift),
            }),
        }
    }

    /// Overwrites `user_id`'s aggregate with the recomputed totals and returns them.
    ///
    /// # Errors
    /// [`Error::UserNotFound`] if the user has no aggregate.
    #[instrument(skip(self))]
    pub async fn repair(&self, user_id: i64) -> Result<Totals> {
        let _guard = self.locks.acquire(user_id).await;
        let txn = self.db.begin().await?;
        let totals = recompute::rebuild(&txn, user_id).await?;
        txn.commit().await?;

        info!(user_id, balance = %totals.balance, "repaired aggregate");
        Ok(totals)
    }

    /// Verifies one user, logging any drift and repairing it when `auto_repair` is set.
    pub async fn reconcile_user(&self, user_id: i64, auto_repair: bool) -> Result<Verification> {
        let verification = self.verify(user_id).await?;
        if let Verification::Drifted(drift) = verification {
            warn!(
                user_id,
                expected_balance = %drift.expected.balance,
                expected_income = %drift.expected.total_income,
                expected_expense = %drift.expected.total_expense,
                actual_balance = %drift.actual.balance,
                actual_income = %drift.actual.total_income,
                actual_expense = %drift.actual.total_expense,
                "aggregate drift detected"
            );
            if auto_repair {
                self.repair(user_id).await?;
            }
        }
        Ok(verification)
    }

    /// Reconciles every user that has an aggregate.
    #[instrument(skip(self))]
    pub async fn reconcile_all(&self, auto_repair: bool) -> Result<ReconciliationReport> {
        let mut report = ReconciliationReport::default();

        for user_id in aggregates::list_user_ids(&self.db).await? {
            report.checked += 1;
            if let Verification::Drifted(drift) = self.reconcile_user(user_id, auto_repair).await? {
                report.drifted.push((user_id, drift));
                if auto_repair {
                    report.repaired += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            drifted = report.drifted.len(),
            repaired = report.repaired,
            locked_users = self.locks.tracked_users(),
            "reconciliation sweep finished"
        );
        Ok(report)
    }

    /// Sweeps every `interval` until `shutdown` resolves. The first sweep runs immediately.
    ///
    /// # Errors
    /// Stops at the first failed sweep and returns its error.
    pub async fn run_periodic<F>(
        &self,
        interval: Duration,
        auto_repair: bool,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("reconciliation stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.reconcile_all(auto_repair)
                        .await
                        .inspect_err(|e| error!("reconciliation sweep failed: {e}"))?;
                }
            }
        }
    }
}
