use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::EngineConfig;

pub type DbPool = SqlitePool;

/// Application state shared by the commands
pub struct AppState {
  pub db: DbPool,
  pub config: EngineConfig,
}

/// Connect to `db_url` and run migrations
pub async fn initialize_db(db_url: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
  info!(url = %db_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
