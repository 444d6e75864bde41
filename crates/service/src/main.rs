//! Tessera - seat inventory service
//!
//! Long-running daemon that owns the ticketing database: runs migrations,
//! seeds first-run catalog data, and sweeps expired reservation holds until
//! told to shut down.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tessera_core::Database;
use tessera_service::seed::{self, SeedFile};
use tessera_service::{BoxOffice, HoldSweeper, Result, ServiceConfig};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Tessera inventory service");

    if let Err(e) = run().await {
        tracing::error!("Service failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::var_os("TESSERA_CONFIG").map(PathBuf::from);
    let config = ServiceConfig::load(config_path.as_deref())?;

    let db_path = config.database_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(&db_path)?;
    tracing::info!(
        path = %db_path.display(),
        schema_version = db.schema_version(),
        "Database ready"
    );

    let office = BoxOffice::new(Arc::new(Mutex::new(db)), config.reservation_config());

    if let Some(seed_path) = &config.seed.file {
        let seed_file = SeedFile::load(seed_path)?;
        seed::apply_if_empty(&office, &seed_file)?;
    }

    let sweeper = HoldSweeper::start(office.reservation_manager(), config.sweep_interval());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    sweeper.shutdown();

    Ok(())
}
