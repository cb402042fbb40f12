//! Ledger configuration loading from config.toml
//!
//! Selects how aggregates are maintained after each mutation and how the
//! reconciliation sweep behaves. Every field has a default, so an absent file or an
//! empty table yields a working configuration.

use crate::core::ledger::UpdateStrategy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::env::VarError;
use std::path::Path;
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Aggregate maintenance settings
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Drift detection settings
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

/// Settings for the ledger core
#[derive(Debug, Default, Deserialize, Clone, Copy)]
pub struct LedgerConfig {
    /// `"delta"` or `"recompute"`
    #[serde(default)]
    pub update_strategy: UpdateStrategy,
}

/// Settings for the reconciliation sweep
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ReconciliationConfig {
    /// Seconds between sweeps; absent means a single sweep
    #[serde(default)]
    pub interval_secs: Option<u64>,
    /// Overwrite drifted aggregates with the recomputed totals
    #[serde(default = "default_auto_repair")]
    pub auto_repair: bool,
}

const fn default_auto_repair() -> bool {
    true
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            interval_secs: None,
            auto_repair: default_auto_repair(),
        }
    }
}

impl ReconciliationConfig {
    /// The sweep interval, if periodic reconciliation is enabled.
    ///
    /// Returns an error for a zero interval.
    pub fn interval(&self) -> Result<Option<Duration>> {
        match self.interval_secs {
            Some(0) => Err(Error::Config {
                message: "reconciliation.interval_secs must be greater than zero".to_string(),
            }),
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => Ok(None),
        }
    }
}

/// Loads the ledger configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has an unrecognized value
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration named by `LEDGER_CONFIG` (default `./config.toml`).
///
/// A missing file is not an error; the defaults are used instead.
pub fn load_default_config() -> Result<Config> {
    let path = match std::env::var("LEDGER_CONFIG") {
        Ok(path) => path,
        Err(VarError::NotPresent) => "config.toml".to_string(),
        Err(e) => return Err(e.into()),
    };
    if Path::new(&path).exists() {
        load_config(path)
    } else {
        tracing::debug!("No configuration file at {path}, using defaults");
        Ok(Config::default())
    }
}
