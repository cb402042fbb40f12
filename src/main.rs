use dotenvy::dotenv;
use ledger_buddy::{
    config::{database, ledger as ledger_config},
    core::Ledger,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the ledger configuration
    let config = ledger_config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    let interval = config.reconciliation.interval()?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    let ledger = Ledger::new(db).with_strategy(config.ledger.update_strategy);
    info!(
        strategy = ?ledger.strategy(),
        auto_repair = config.reconciliation.auto_repair,
        "Ledger ready."
    );
    let reconciler = ledger.reconciler();
    let auto_repair = config.reconciliation.auto_repair;

    // 5. Reconcile once, or keep sweeping until Ctrl-C
    match interval {
        Some(interval) => {
            info!(?interval, "Starting periodic reconciliation.");
            reconciler
                .run_periodic(interval, auto_repair, async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {e}");
                    }
                })
                .await?;
        }
        None => {
            let report = reconciler.reconcile_all(auto_repair).await?;
            if !report.drifted.is_empty() && !auto_repair {
                error!(
                    drifted = report.drifted.len(),
                    "Drift found; rerun with reconciliation.auto_repair = true to repair."
                );
            }
        }
    }

    Ok(())
}
