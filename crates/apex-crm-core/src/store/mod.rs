//! Storage abstraction for Apex CRM.
//!
//! The [`Store`] trait combines the two storage resources the entity layer
//! needs: a point-access **record store** holding one JSON value per
//! `(entity, id)` key, and an ordered **secondary index** of ids per index
//! name with cursor pagination. It also persists the per-entity "seeded"
//! flag so seeding survives restarts.
//!
//! Implementations must be `Send + Sync` to work with async runtimes, and
//! must make `index_add` / `index_remove` atomic: concurrent creates and
//! deletes against one index may never leave duplicate or dangling ids.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::error::EntityError;

/// One page of ids from a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexPage {
    pub items: Vec<String>,
    pub next_cursor: Option<String>,
}

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_record`](Store::get_record) | Fetch a record's JSON state |
/// | [`put_record`](Store::put_record) | Write (insert or replace) a record |
/// | [`delete_record`](Store::delete_record) | Remove a record, reporting whether it existed |
/// | [`record_exists`](Store::record_exists) | Point existence check |
/// | [`index_add`](Store::index_add) | Append an id to an index (no duplicates) |
/// | [`index_remove`](Store::index_remove) | Remove an id from an index (no-op if absent) |
/// | [`index_list`](Store::index_list) | Page through an index in insertion order |
/// | [`index_len`](Store::index_len) | Number of ids in an index |
/// | [`is_seeded`](Store::is_seeded) / [`mark_seeded`](Store::mark_seeded) | Persisted seed flag |
///
/// Cursors are opaque strings produced by the backend. Backends encode the
/// insertion sequence of the last returned entry, so a page boundary does
/// not move when earlier ids are removed. A cursor that does not parse is a
/// caller error and is reported as [`EntityError::Validation`] by
/// [`parse_cursor`].
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_record(&self, entity: &str, id: &str) -> Result<Option<serde_json::Value>>;

    async fn put_record(&self, entity: &str, id: &str, value: &serde_json::Value) -> Result<()>;

    /// Returns `true` when a record existed and was removed.
    async fn delete_record(&self, entity: &str, id: &str) -> Result<bool>;

    async fn record_exists(&self, entity: &str, id: &str) -> Result<bool>;

    async fn index_add(&self, index: &str, id: &str) -> Result<()>;

    async fn index_remove(&self, index: &str, id: &str) -> Result<()>;

    /// Up to `limit` ids after `cursor` (`None` = from the start).
    /// `next_cursor` is `None` once the end of the index is reached.
    async fn index_list(&self, index: &str, cursor: Option<u64>, limit: usize)
        -> Result<IndexPage>;

    async fn index_len(&self, index: &str) -> Result<u64>;

    async fn is_seeded(&self, entity: &str) -> Result<bool>;

    async fn mark_seeded(&self, entity: &str) -> Result<()>;
}

/// Decode an opaque cursor string into the sequence position backends use.
pub fn parse_cursor(cursor: Option<&str>) -> Result<Option<u64>, EntityError> {
    match cursor.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| EntityError::validation(format!("invalid cursor: {}", raw))),
    }
}

pub fn encode_cursor(seq: u64) -> String {
    seq.to_string()
}
