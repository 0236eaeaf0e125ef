pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod importers;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod store;
pub mod strength;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use tracing::{error, info};

use cli::Cli;
use config::EngineConfig;
use db::AppState;

/// Parse arguments, open the database and run one command
pub async fn run() -> Result<(), String> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  logging::init(cli.verbose);

  let mut config = EngineConfig::from_env().map_err(|e| e.to_string())?;
  if let Some(url) = &cli.database_url {
    config.database_url = url.clone();
  }

  let pool = db::initialize_db(&config.database_url)
    .await
    .map_err(|e| format!("Failed to initialize database: {}", e))?;

  let seeded = store::seed_default_personal_bests(&pool).await?;
  if seeded > 0 {
    info!(seeded, "Database ready");
  }

  let state = AppState { db: pool, config };
  let result = cli::execute(&cli, &state).await;
  state.db.close().await;

  if let Err(e) = &result {
    error!(error = %e, "Command failed");
  }
  result
}
