//! Core business logic - framework-agnostic ledger operations.

/// Totals and delta arithmetic
pub mod aggregate;
/// Transaction lifecycle with aggregate maintenance
pub mod ledger;
/// Per-user mutation locks
pub mod locks;
/// Drift detection and repair
pub mod reconcile;
/// Totals recomputed from the transaction store
pub mod recompute;

pub use aggregate::{Delta, Totals};
pub use ledger::{Ledger, UpdateStrategy};
pub use reconcile::{Drift, ReconciliationReport, Reconciler, Verification};
