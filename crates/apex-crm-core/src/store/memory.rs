//! In-memory [`Store`] implementation for tests and ephemeral servers.
//!
//! Records live in a `HashMap` keyed by `(entity, id)`. Each index is a
//! `BTreeMap` from insertion sequence to id plus a reverse map for O(log n)
//! removal. Everything sits behind `std::sync::RwLock`; every mutation takes
//! a single write guard, which makes index add/remove atomic.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{encode_cursor, IndexPage, Store};

#[derive(Default)]
struct IndexState {
    next_seq: u64,
    by_seq: BTreeMap<u64, String>,
    by_id: HashMap<String, u64>,
}

/// In-memory store for testing and `backend = "memory"` deployments.
pub struct InMemoryStore {
    records: RwLock<HashMap<(String, String), serde_json::Value>>,
    indexes: RwLock<HashMap<String, IndexState>>,
    seeded: RwLock<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashMap::new()),
            seeded: RwLock::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn key(entity: &str, id: &str) -> (String, String) {
    (entity.to_string(), id.to_string())
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_record(&self, entity: &str, id: &str) -> Result<Option<serde_json::Value>> {
        Ok(read(&self.records)?.get(&key(entity, id)).cloned())
    }

    async fn put_record(&self, entity: &str, id: &str, value: &serde_json::Value) -> Result<()> {
        write(&self.records)?.insert(key(entity, id), value.clone());
        Ok(())
    }

    async fn delete_record(&self, entity: &str, id: &str) -> Result<bool> {
        Ok(write(&self.records)?.remove(&key(entity, id)).is_some())
    }

    async fn record_exists(&self, entity: &str, id: &str) -> Result<bool> {
        Ok(read(&self.records)?.contains_key(&key(entity, id)))
    }

    async fn index_add(&self, index: &str, id: &str) -> Result<()> {
        let mut indexes = write(&self.indexes)?;
        let state = indexes.entry(index.to_string()).or_default();
        if state.by_id.contains_key(id) {
            return Ok(());
        }
        state.next_seq += 1;
        let seq = state.next_seq;
        state.by_seq.insert(seq, id.to_string());
        state.by_id.insert(id.to_string(), seq);
        Ok(())
    }

    async fn index_remove(&self, index: &str, id: &str) -> Result<()> {
        let mut indexes = write(&self.indexes)?;
        if let Some(state) = indexes.get_mut(index) {
            if let Some(seq) = state.by_id.remove(id) {
                state.by_seq.remove(&seq);
            }
        }
        Ok(())
    }

    async fn index_list(
        &self,
        index: &str,
        cursor: Option<u64>,
        limit: usize,
    ) -> Result<IndexPage> {
        let indexes = read(&self.indexes)?;
        let Some(state) = indexes.get(index) else {
            return Ok(IndexPage {
                items: Vec::new(),
                next_cursor: None,
            });
        };

        let lower = match cursor {
            Some(seq) => Bound::Excluded(seq),
            None => Bound::Unbounded,
        };
        // One extra entry tells us whether another page exists.
        let window: Vec<(u64, &String)> = state
            .by_seq
            .range((lower, Bound::Unbounded))
            .take(limit + 1)
            .map(|(seq, id)| (*seq, id))
            .collect();

        let has_more = window.len() > limit;
        let page = &window[..window.len().min(limit)];
        let next_cursor = match page.last() {
            Some((seq, _)) if has_more => Some(encode_cursor(*seq)),
            _ => None,
        };

        Ok(IndexPage {
            items: page.iter().map(|(_, id)| (*id).clone()).collect(),
            next_cursor,
        })
    }

    async fn index_len(&self, index: &str) -> Result<u64> {
        Ok(read(&self.indexes)?
            .get(index)
            .map(|s| s.by_seq.len() as u64)
            .unwrap_or(0))
    }

    async fn is_seeded(&self, entity: &str) -> Result<bool> {
        Ok(read(&self.seeded)?.contains(entity))
    }

    async fn mark_seeded(&self, entity: &str) -> Result<()> {
        write(&self.seeded)?.insert(entity.to_string());
        Ok(())
    }
}
