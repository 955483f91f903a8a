//! StateStore — redb-backed deployment registry.
//!
//! Deployments, the bounded id index and the analytics summary are
//! JSON-serialized into the single [`KV`] table. The store supports both
//! on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use appforge_core::{AnalyticsSummary, Deployment, DeploymentId, DeploymentIndex};
use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Default bound on the deployment index.
pub const DEFAULT_INDEX_CAPACITY: usize = 1000;

/// Thread-safe deployment registry backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
    index_capacity: usize,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self::from_database(db)?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self::from_database(db)?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn from_database(db: Database) -> StateResult<Self> {
        let store = Self {
            db: Arc::new(db),
            index_capacity: DEFAULT_INDEX_CAPACITY,
        };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Bound the deployment index to `capacity` ids (at least one).
    pub fn with_index_capacity(mut self, capacity: usize) -> Self {
        self.index_capacity = capacity.max(1);
        self
    }

    pub fn index_capacity(&self) -> usize {
        self.index_capacity
    }

    /// Create the table if it doesn't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(KV).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Deployments ────────────────────────────────────────────────

    /// Store a new deployment and prepend it to the index in one write
    /// transaction. Either both keys change or neither does.
    ///
    /// Returns the ids evicted from the index tail.
    pub fn create_deployment(&self, deployment: &Deployment) -> StateResult<Vec<DeploymentId>> {
        check_id(&deployment.id)?;
        let key = deployment_key(&deployment.id);
        let value = encode(deployment)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let evicted;
        {
            let mut table = txn.open_table(KV).map_err(map_err!(Table))?;
            let mut index = read_index(&table, self.index_capacity)?;
            evicted = index.push_front(deployment.id.clone());
            let list = encode(&index.to_vec())?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            table
                .insert(DEPLOYMENT_LIST_KEY, list.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, evicted = evicted.len(), "deployment created");
        Ok(evicted)
    }

    /// Insert or overwrite a deployment record without touching the index.
    pub fn put_deployment(&self, deployment: &Deployment) -> StateResult<()> {
        check_id(&deployment.id)?;
        let key = deployment_key(&deployment.id);
        let value = encode(deployment)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(KV).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "deployment stored");
        Ok(())
    }

    /// Get a deployment by id. Reserved ids are never found.
    pub fn get_deployment(&self, id: &str) -> StateResult<Option<Deployment>> {
        if is_reserved_id(id) {
            return Ok(None);
        }
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(KV).map_err(map_err!(Table))?;
        read_json(&table, &deployment_key(id))
    }

    // ── Index ──────────────────────────────────────────────────────

    /// Prepend an id to the index, evicting from the tail past capacity.
    pub fn prepend_index(&self, id: &str) -> StateResult<Vec<DeploymentId>> {
        check_id(id)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let evicted;
        {
            let mut table = txn.open_table(KV).map_err(map_err!(Table))?;
            let mut index = read_index(&table, self.index_capacity)?;
            evicted = index.push_front(id.to_string());
            let list = encode(&index.to_vec())?;
            table
                .insert(DEPLOYMENT_LIST_KEY, list.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(evicted)
    }

    /// Current index, newest first.
    pub fn index(&self) -> StateResult<DeploymentIndex> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(KV).map_err(map_err!(Table))?;
        read_index(&table, self.index_capacity)
    }

    // ── Analytics ──────────────────────────────────────────────────

    /// Read-modify-write the analytics summary inside one write transaction.
    ///
    /// Concurrent callers are serialized by redb, so no increment is lost.
    pub fn update_analytics<F>(&self, update: F) -> StateResult<AnalyticsSummary>
    where
        F: FnOnce(&mut AnalyticsSummary),
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let summary;
        {
            let mut table = txn.open_table(KV).map_err(map_err!(Table))?;
            let mut current: AnalyticsSummary =
                read_json(&table, ANALYTICS_SUMMARY_KEY)?.unwrap_or_default();
            update(&mut current);
            let value = encode(&current)?;
            table
                .insert(ANALYTICS_SUMMARY_KEY, value.as_slice())
                .map_err(map_err!(Write))?;
            summary = current;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(summary)
    }

    /// Stored analytics summary, or an empty one if nothing was recorded yet.
    pub fn analytics_summary(&self) -> StateResult<AnalyticsSummary> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(KV).map_err(map_err!(Table))?;
        Ok(read_json(&table, ANALYTICS_SUMMARY_KEY)?.unwrap_or_default())
    }
}

fn check_id(id: &str) -> StateResult<()> {
    if is_reserved_id(id) {
        return Err(StateError::ReservedId(id.to_string()));
    }
    Ok(())
}

fn encode<T: Serialize + ?Sized>(value: &T) -> StateResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(map_err!(Serialize))
}

fn read_json<T, Tbl>(table: &Tbl, key: &str) -> StateResult<Option<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key).map_err(map_err!(Read))? {
        Some(guard) => serde_json::from_slice(guard.value())
            .map(Some)
            .map_err(|e| StateError::Deserialize {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn read_index<Tbl>(table: &Tbl, capacity: usize) -> StateResult<DeploymentIndex>
where
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    let ids: Vec<DeploymentId> = read_json(table, DEPLOYMENT_LIST_KEY)?.unwrap_or_default();
    Ok(DeploymentIndex::from_ids(ids, capacity))
}
