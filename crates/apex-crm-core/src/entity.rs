//! The indexed-entity persistence layer.
//!
//! An [`Entity`] is a record type with its own key namespace in the record
//! store and its own secondary index. [`IndexedEntity`] ties an entity type
//! to a [`Store`] and exposes the full read/write contract:
//!
//! | Method | Store effect |
//! |--------|--------------|
//! | [`exists`](IndexedEntity::exists) | point read |
//! | [`get_state`](IndexedEntity::get_state) | point read, `NotFound` if absent |
//! | [`create`](IndexedEntity::create) | record write, then index add |
//! | [`patch`](IndexedEntity::patch) | read, typed merge, write |
//! | [`mutate`](IndexedEntity::mutate) | read, transform, write |
//! | [`delete`](IndexedEntity::delete) | record delete, then index remove |
//! | [`list`](IndexedEntity::list) | index page, then point reads |
//! | [`ensure_seed`](IndexedEntity::ensure_seed) | one-time population |
//!
//! # Concurrency
//!
//! Writes addressed at one id are serialized through a keyed lock table:
//! `create`, `patch`, `mutate` and `delete` hold the id's async mutex for
//! their whole read-modify-write. The index is shared across ids; its
//! add/remove are atomic inside each [`Store`] backend.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use crate::error::EntityError;
use crate::store::{parse_cursor, Store};

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

/// A record type managed by [`IndexedEntity`].
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Key namespace in the record store.
    const ENTITY_NAME: &'static str;
    /// Name of the secondary index listing this type's ids.
    const INDEX_NAME: &'static str;

    /// Typed partial update, merged field by field by [`apply_patch`](Entity::apply_patch).
    type Patch: Send;

    /// Zero value for a new record: every field present and empty.
    fn initial_state() -> Self;

    /// Records written the first time the type is used on an empty store.
    fn seed_data() -> Vec<Self>;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Human-readable name used in pick lists.
    fn label(&self) -> &str;

    fn apply_patch(&mut self, patch: Self::Patch);

    /// Field invariants checked before every write.
    fn validate(&self) -> Result<(), EntityError> {
        Ok(())
    }
}

/// One page of resolved records.
#[derive(Debug, Clone, Serialize)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub next_cursor: Option<String>,
}

/// Clamp a caller-supplied page size into `[1, max]`, using `default` when
/// none was given.
pub fn clamp_limit(requested: Option<i64>, default: usize, max: usize) -> usize {
    let max = max.max(1);
    match requested {
        None => default.clamp(1, max),
        Some(n) if n < 1 => 1,
        Some(n) => (n as u64).min(max as u64) as usize,
    }
}

/// Read a raw `limit` query value the way a numeric coercion would: a
/// fraction truncates toward zero, and anything unparseable becomes 0 (which
/// [`clamp_limit`] raises to 1). Absent or blank means "use the default".
pub fn parse_limit(raw: Option<&str>) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n.trunc() as i64),
        _ => Some(0),
    }
}

// ============ Keyed locks ============

/// Async mutex per id. Slots are dropped from the table once no task holds
/// or waits on them.
#[derive(Default)]
struct KeyedLocks {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

struct IdGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a KeyedLocks,
    id: String,
}

impl KeyedLocks {
    async fn lock(&self, id: &str) -> Result<IdGuard<'_>, EntityError> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| anyhow::anyhow!("entity lock table poisoned"))?;
            slots.entry(id.to_string()).or_default().clone()
        };
        Ok(IdGuard {
            guard: Some(slot.lock_owned().await),
            locks: self,
            id: id.to_string(),
        })
    }

    fn prune(&self, id: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            if slots.get(id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                slots.remove(id);
            }
        }
    }
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.prune(&self.id);
    }
}

// ============ IndexedEntity ============

/// Store + index façade for one entity type.
pub struct IndexedEntity<E: Entity> {
    store: Arc<dyn Store>,
    locks: KeyedLocks,
    seed_lock: tokio::sync::Mutex<()>,
    seeded: AtomicBool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> IndexedEntity<E> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: KeyedLocks::default(),
            seed_lock: tokio::sync::Mutex::new(()),
            seeded: AtomicBool::new(false),
            _entity: PhantomData,
        }
    }

    pub async fn exists(&self, id: &str) -> Result<bool, EntityError> {
        Ok(self.store.record_exists(E::ENTITY_NAME, id).await?)
    }

    pub async fn get_state(&self, id: &str) -> Result<E, EntityError> {
        self.load(id)
            .await?
            .ok_or_else(|| EntityError::not_found(E::ENTITY_NAME, id))
    }

    /// Persist a new record. An empty `id` is replaced with a fresh UUID;
    /// an id that already has a record is refused.
    pub async fn create(&self, mut record: E) -> Result<E, EntityError> {
        if record.id().trim().is_empty() {
            record.set_id(uuid::Uuid::new_v4().to_string());
        }
        record.validate()?;

        let id = record.id().to_string();
        let _guard = self.locks.lock(&id).await?;
        if self.exists(&id).await? {
            return Err(EntityError::validation(format!(
                "{} already exists: {}",
                E::ENTITY_NAME,
                id
            )));
        }
        self.insert(&record).await?;
        tracing::debug!(entity = E::ENTITY_NAME, %id, "created");
        Ok(record)
    }

    /// Merge `patch` onto the stored record. The index is untouched.
    pub async fn patch(&self, id: &str, patch: E::Patch) -> Result<(), EntityError> {
        let _guard = self.locks.lock(id).await?;
        let mut record = self.get_state(id).await?;
        record.apply_patch(patch);
        record.validate()?;
        self.write(id, &record).await
    }

    /// Replace the stored record with `f(current)`. `f` may not change the id.
    pub async fn mutate<F>(&self, id: &str, f: F) -> Result<(), EntityError>
    where
        F: FnOnce(E) -> E + Send,
    {
        let _guard = self.locks.lock(id).await?;
        let current = self.get_state(id).await?;
        let next = f(current);
        if next.id() != id {
            return Err(EntityError::validation(format!(
                "{} id is immutable: {} cannot become {}",
                E::ENTITY_NAME,
                id,
                next.id()
            )));
        }
        next.validate()?;
        self.write(id, &next).await
    }

    /// Remove the record and its index entry. Returns whether a record
    /// existed; when none did the index is left alone.
    pub async fn delete(&self, id: &str) -> Result<bool, EntityError> {
        let _guard = self.locks.lock(id).await?;
        let existed = self.store.delete_record(E::ENTITY_NAME, id).await?;
        if existed {
            self.store.index_remove(E::INDEX_NAME, id).await?;
            tracing::debug!(entity = E::ENTITY_NAME, %id, "deleted");
        }
        Ok(existed)
    }

    /// One page of records in index order. Index entries whose record is
    /// missing or unreadable are skipped and logged. A `limit` of zero is
    /// treated as one.
    pub async fn list(&self, cursor: Option<&str>, limit: usize) -> Result<Page<E>, EntityError> {
        let position = parse_cursor(cursor)?;
        let page = self
            .store
            .index_list(E::INDEX_NAME, position, limit.max(1))
            .await?;

        let mut items = Vec::with_capacity(page.items.len());
        for id in &page.items {
            match self.load(id).await {
                Ok(Some(record)) => items.push(record),
                Ok(None) => tracing::warn!(
                    entity = E::ENTITY_NAME,
                    %id,
                    "index entry has no stored record; skipping"
                ),
                Err(EntityError::Internal(err)) if err.is::<serde_json::Error>() => {
                    tracing::error!(entity = E::ENTITY_NAME, %id, error = %err, "skipping unreadable record")
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Page {
            items,
            next_cursor: page.next_cursor,
        })
    }

    /// Every record, following cursors until the index is exhausted.
    pub async fn list_all(&self) -> Result<Vec<E>, EntityError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list(cursor.as_deref(), MAX_PAGE_LIMIT).await?;
            all.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(all)
    }

    pub async fn count(&self) -> Result<u64, EntityError> {
        Ok(self.store.index_len(E::INDEX_NAME).await?)
    }

    /// Populate an empty store with [`Entity::seed_data`], at most once per
    /// store lifetime. Cheap after the first call in a process.
    pub async fn ensure_seed(&self) -> Result<(), EntityError> {
        if self.seeded.load(Ordering::Acquire) {
            return Ok(());
        }
        let _seeding = self.seed_lock.lock().await;
        if self.seeded.load(Ordering::Acquire) {
            return Ok(());
        }

        if !self.store.is_seeded(E::ENTITY_NAME).await? {
            if self.count().await? == 0 {
                let seeds = E::seed_data();
                let total = seeds.len();
                for mut record in seeds {
                    if record.id().trim().is_empty() {
                        record.set_id(uuid::Uuid::new_v4().to_string());
                    }
                    let _guard = self.locks.lock(record.id()).await?;
                    self.insert(&record).await?;
                }
                tracing::info!(entity = E::ENTITY_NAME, count = total, "seeded empty store");
            }
            self.store.mark_seeded(E::ENTITY_NAME).await?;
        }

        self.seeded.store(true, Ordering::Release);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<E>, EntityError> {
        match self.store.get_record(E::ENTITY_NAME, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, id: &str, record: &E) -> Result<(), EntityError> {
        let value = serde_json::to_value(record)?;
        self.store.put_record(E::ENTITY_NAME, id, &value).await?;
        Ok(())
    }

    /// Record first, then index. If the index add fails the record is
    /// rolled back so neither side is left holding an orphan.
    async fn insert(&self, record: &E) -> Result<(), EntityError> {
        let id = record.id();
        self.write(id, record).await?;
        if let Err(err) = self.store.index_add(E::INDEX_NAME, id).await {
            if let Err(rollback) = self.store.delete_record(E::ENTITY_NAME, id).await {
                tracing::error!(
                    entity = E::ENTITY_NAME,
                    %id,
                    error = %rollback,
                    "failed to roll back record after index failure"
                );
            }
            return Err(EntityError::Internal(
                err.context(format!("failed to index {} {}", E::ENTITY_NAME, id)),
            ));
        }
        Ok(())
    }
}
