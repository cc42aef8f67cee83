//! Global arguments for the CLI.

use anyhow::{Context, Result};
use clap::Parser;
use hashprice_cli::{LogArgs, MetricsArgs};
use hashprice_primitives::default_hardware_profiles;
use hashprice_storage::{HardwareProfileStorage, HashpriceDb};
use std::path::PathBuf;
use tracing::info;

/// Global arguments for the CLI.
#[derive(Parser, Clone, Debug)]
pub(crate) struct GlobalArgs {
    /// Logging arguments.
    #[command(flatten)]
    pub(crate) log_args: LogArgs,
    /// Path of the database directory.
    #[arg(
        long = "db.path",
        global = true,
        default_value = "hashprice-db",
        env = "HASHPRICE_DB_PATH"
    )]
    pub(crate) db_path: PathBuf,
    /// Prometheus CLI arguments.
    #[command(flatten)]
    pub(crate) metrics: MetricsArgs,
}

impl GlobalArgs {
    /// Opens the database.
    pub(crate) fn open_db(&self) -> Result<HashpriceDb> {
        HashpriceDb::open(&self.db_path)
            .with_context(|| format!("failed to open database at {}", self.db_path.display()))
    }

    /// Opens the database, seeding the default hardware profiles into an empty store.
    pub(crate) fn open_seeded_db(&self) -> Result<HashpriceDb> {
        let db = self.open_db()?;
        if db.hardware_profiles()?.is_empty() {
            let defaults = default_hardware_profiles();
            db.upsert_hardware_profiles(&defaults)?;
            info!(target: "storage", count = defaults.len(), "Seeded default hardware profiles");
        }
        Ok(db)
    }
}
