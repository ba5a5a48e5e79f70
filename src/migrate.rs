//! Database schema migrations (idempotent).
//!
//! | Table | Holds |
//! |-------|-------|
//! | `records` | one JSON state per `(entity, id)` |
//! | `index_entries` | ordered ids per index; `seq` is the pagination cursor |
//! | `seed_flags` | entity types that have been seeded |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            entity TEXT NOT NULL,
            id TEXT NOT NULL,
            state_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (entity, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // AUTOINCREMENT keeps seq monotonic even after the newest row is
    // deleted, so an issued cursor never points at a reused position.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_entries (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            index_name TEXT NOT NULL,
            id TEXT NOT NULL,
            UNIQUE(index_name, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS seed_flags (
            entity TEXT PRIMARY KEY,
            seeded_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_index_entries_name_seq ON index_entries(index_name, seq)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
