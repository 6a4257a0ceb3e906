//! MongoDB user bootstrap
//!
//! Creates the owner, writer and reader accounts on `DB_NAME`. Safe to run on
//! every container start: existing accounts are reported and left untouched.

use anyhow::Result;
use common::{init_logging, ProcessEnv};
use mongo_init::{bootstrap, Config, MongoAdmin};
use std::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging("create-users");

    let start = Instant::now();
    info!("User bootstrap starting...");

    let config = match Config::from_env(&ProcessEnv) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Invalid configuration");
            std::process::exit(1);
        }
    };

    let admin = match MongoAdmin::connect(
        &config.mongo_uri,
        "mongo-init",
        config.server_selection_timeout,
    )
    .await
    {
        Ok(a) => a,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to connect to MongoDB");
            std::process::exit(1);
        }
    };

    info!(database = %config.database, users = config.users.len(), "Creating users");

    let report = bootstrap(&admin, &config.database, &config.users).await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(duration_ms, "User bootstrap completed");

    if config.strict && report.has_failures() {
        let failed: Vec<&str> = report
            .outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(|o| o.username())
            .collect();
        error!(failed = ?failed, "Strict mode: some users could not be created");
        std::process::exit(1);
    }

    Ok(())
}
