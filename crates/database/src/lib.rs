//! Record store for the duplex backend: connection handling, schema
//! migrations and the repositories the message core reads and writes
//! through.

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

use duplex_config::DatabaseConfig;
use sqlx::SqlitePool;

/// Open the configured database and bring the schema up to date. The
/// returned pool is the one shared handle the rest of the backend clones.
pub async fn initialize_database(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let pool = prepare_database(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
