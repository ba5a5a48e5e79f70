//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the schema created by
//! [`migrate`](crate::migrate): records as JSON text keyed by
//! `(entity, id)`, index entries ordered by an autoincrement `seq`, and one
//! row per seeded entity type. Index add and remove are single statements,
//! so SQLite's own write serialization makes them atomic.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use apex_crm_core::store::{encode_cursor, IndexPage, Store};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_record(&self, entity: &str, id: &str) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT state_json FROM records WHERE entity = ? AND id = ?")
            .bind(entity)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let state_json: String = row.get("state_json");
                Ok(Some(serde_json::from_str(&state_json)?))
            }
            None => Ok(None),
        }
    }

    async fn put_record(&self, entity: &str, id: &str, value: &serde_json::Value) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let state_json = serde_json::to_string(value)?;

        sqlx::query(
            r#"
            INSERT INTO records (entity, id, state_json, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(entity, id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entity)
        .bind(id)
        .bind(&state_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_record(&self, entity: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM records WHERE entity = ? AND id = ?")
            .bind(entity)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_exists(&self, entity: &str, id: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM records WHERE entity = ? AND id = ?")
                .bind(entity)
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn index_add(&self, index: &str, id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO index_entries (index_name, id) VALUES (?, ?)")
            .bind(index)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn index_remove(&self, index: &str, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM index_entries WHERE index_name = ? AND id = ?")
            .bind(index)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn index_list(
        &self,
        index: &str,
        cursor: Option<u64>,
        limit: usize,
    ) -> Result<IndexPage> {
        let after = cursor
            .map(|seq| i64::try_from(seq).unwrap_or(i64::MAX))
            .unwrap_or(0);
        // One extra row tells us whether another page exists.
        let fetch = i64::try_from(limit).unwrap_or(i64::MAX - 1) + 1;

        let rows = sqlx::query(
            r#"
            SELECT seq, id FROM index_entries
            WHERE index_name = ? AND seq > ?
            ORDER BY seq ASC
            LIMIT ?
            "#,
        )
        .bind(index)
        .bind(after)
        .bind(fetch)
        .fetch_all(&self.pool)
        .await?;

        let has_more = rows.len() > limit;
        let page = &rows[..rows.len().min(limit)];
        let next_cursor = match page.last() {
            Some(row) if has_more => {
                let seq: i64 = row.get("seq");
                Some(encode_cursor(seq as u64))
            }
            _ => None,
        };

        Ok(IndexPage {
            items: page.iter().map(|row| row.get::<String, _>("id")).collect(),
            next_cursor,
        })
    }

    async fn index_len(&self, index: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM index_entries WHERE index_name = ?")
                .bind(index)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    async fn is_seeded(&self, entity: &str) -> Result<bool> {
        let seeded: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM seed_flags WHERE entity = ?")
                .bind(entity)
                .fetch_one(&self.pool)
                .await?;
        Ok(seeded)
    }

    async fn mark_seeded(&self, entity: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO seed_flags (entity, seeded_at) VALUES (?, ?)")
            .bind(entity)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, Config};
    use crate::db;
    use serde_json::json;
    use tempfile::TempDir;

    async fn store(tmp: &TempDir) -> SqliteStore {
        let mut cfg = Config::minimal();
        cfg.db.backend = Backend::Sqlite;
        cfg.db.path = tmp.path().join("crm.sqlite");
        let pool = db::connect(&cfg).await.unwrap();
        crate::migrate::apply(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn test_record_round_trip_and_delete() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;

        store
            .put_record("client", "c1", &json!({"id": "c1", "company": "Acme"}))
            .await
            .unwrap();
        store
            .put_record("client", "c1", &json!({"id": "c1", "company": "Acme 2"}))
            .await
            .unwrap();
        assert_eq!(
            store.get_record("client", "c1").await.unwrap().unwrap()["company"],
            "Acme 2"
        );
        assert!(store.record_exists("client", "c1").await.unwrap());
        assert!(!store.record_exists("lead", "c1").await.unwrap());

        assert!(store.delete_record("client", "c1").await.unwrap());
        assert!(!store.delete_record("client", "c1").await.unwrap());
        assert!(store.get_record("client", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_index_pages_in_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        for id in ["a", "b", "c", "d", "e"] {
            store.index_add("clients", id).await.unwrap();
        }
        store.index_add("clients", "c").await.unwrap();
        store.index_add("leads", "x").await.unwrap();
        assert_eq!(store.index_len("clients").await.unwrap(), 5);

        let first = store.index_list("clients", None, 2).await.unwrap();
        assert_eq!(first.items, vec!["a", "b"]);
        let c1 = first.next_cursor.unwrap().parse().unwrap();

        store.index_remove("clients", "a").await.unwrap();
        store.index_remove("clients", "ghost").await.unwrap();

        let second = store.index_list("clients", Some(c1), 2).await.unwrap();
        assert_eq!(second.items, vec!["c", "d"]);
        let c2 = second.next_cursor.unwrap().parse().unwrap();

        let third = store.index_list("clients", Some(c2), 2).await.unwrap();
        assert_eq!(third.items, vec!["e"]);
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_seed_flags_persist() {
        let tmp = TempDir::new().unwrap();
        {
            let store = store(&tmp).await;
            assert!(!store.is_seeded("lead").await.unwrap());
            store.mark_seeded("lead").await.unwrap();
            store.mark_seeded("lead").await.unwrap();
            store.pool().close().await;
        }
        let reopened = store(&tmp).await;
        assert!(reopened.is_seeded("lead").await.unwrap());
        assert!(!reopened.is_seeded("client").await.unwrap());
    }
}
