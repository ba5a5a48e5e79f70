//! Storage backend construction.
//!
//! [`connect`] opens the SQLite pool (WAL mode, parent directories created
//! on demand). [`open_store`] picks the configured [`Store`] backend and
//! runs migrations for SQLite so a fresh database is usable immediately.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use apex_crm_core::store::memory::InMemoryStore;
use apex_crm_core::store::Store;

use crate::config::{Backend, Config};
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Create a connection pool to the configured SQLite database.
///
/// - Creates the database file and parent directories if they don't exist.
/// - Enables WAL journal mode for concurrent read/write.
/// - Returns a pool with up to 5 connections.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open the configured backend.
pub async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.db.backend {
        Backend::Memory => Ok(Arc::new(InMemoryStore::new())),
        Backend::Sqlite => {
            let pool = connect(config).await?;
            migrate::apply(&pool).await?;
            Ok(Arc::new(SqliteStore::new(pool)))
        }
    }
}
