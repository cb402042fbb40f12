/// Database configuration and connection management
pub mod database;

/// Ledger and reconciliation settings loaded from config.toml
pub mod ledger;
