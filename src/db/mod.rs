use anyhow::{Context, Result};
use sea_orm::{Database, DatabaseConnection};

pub mod entity;

/// Connect to the game database. There is no fallback URL: every
/// deployment names its own database, so a missing `DATABASE_URL` is
/// a configuration error, not a default.
pub async fn connect() -> Result<DatabaseConnection> {
    let url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to reach the game database")?;
    Database::connect(url)
        .await
        .context("failed to connect to the game database")
}
