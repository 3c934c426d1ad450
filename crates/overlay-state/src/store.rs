//! StateStore: redb-backed persistence for declared custom overlays.
//!
//! Every operation runs in its own redb transaction, so `get_all` always
//! returns a point-in-time snapshot even while another handle writes.
//!
//! redb locks the database file for as long as it is open. [`StateStore`]
//! keeps it open; [`FileStore`] opens it per operation so the daemon and
//! operator commands can share one file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use redb::{Database, DatabaseError, ReadableDatabase, ReadableTable};
use tracing::debug;

use overlay_core::{validate_overlay_name, OverlayConfig};

use crate::error::{StateError, StateResult};
use crate::tables::CUSTOM_OVERLAYS;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Access to declared overlays, keyed by name.
pub trait OverlayStore {
    /// Insert or replace the body declared under `name`.
    fn put(&self, name: &str, config: &OverlayConfig) -> StateResult<()>;

    fn get(&self, name: &str) -> StateResult<Option<OverlayConfig>>;

    /// Consistent snapshot of every declared overlay, ordered by name.
    fn get_all(&self) -> StateResult<BTreeMap<String, OverlayConfig>>;

    /// Remove a declared overlay. Fails with `NotFound` if it does not exist.
    fn delete(&self, name: &str) -> StateResult<()>;
}

/// Thread-safe overlay store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self::from_database(db)?;
        debug!(?path, "overlay store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self::from_database(db)?;
        debug!("in-memory overlay store opened");
        Ok(store)
    }

    fn from_database(db: Database) -> StateResult<Self> {
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CUSTOM_OVERLAYS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

impl OverlayStore for StateStore {
    fn put(&self, name: &str, config: &OverlayConfig) -> StateResult<()> {
        validate_overlay_name(name)?;
        let value = serde_json::to_vec(config).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(CUSTOM_OVERLAYS).map_err(map_err!(Table))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, "custom overlay stored");
        Ok(())
    }

    fn get(&self, name: &str) -> StateResult<Option<OverlayConfig>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CUSTOM_OVERLAYS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let config: OverlayConfig =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    fn get_all(&self) -> StateResult<BTreeMap<String, OverlayConfig>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CUSTOM_OVERLAYS).map_err(map_err!(Table))?;
        let mut results = BTreeMap::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let config: OverlayConfig =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.insert(key.value().to_string(), config);
        }
        Ok(results)
    }

    fn delete(&self, name: &str) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(CUSTOM_OVERLAYS).map_err(map_err!(Table))?;
            existed = table.remove(name).map_err(map_err!(Write))?.is_some();
        }
        if !existed {
            txn.abort().map_err(map_err!(Transaction))?;
            return Err(StateError::NotFound(name.to_string()));
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, "custom overlay deleted");
        Ok(())
    }
}

const OPEN_ATTEMPTS: u32 = 40;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(25);

/// Overlay store that opens the database file for each operation and
/// releases it before returning.
///
/// While another process holds the file, opening is retried for about a
/// second before failing with [`StateError::Open`].
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create the database file and its tables if missing.
    pub fn open(path: &Path) -> StateResult<Self> {
        let store = Self {
            path: path.to_path_buf(),
        };
        store.connect()?;
        debug!(?path, "shared overlay store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StateResult<StateStore> {
        let mut attempt = 1;
        loop {
            match Database::create(&self.path) {
                Ok(db) => return StateStore::from_database(db),
                Err(DatabaseError::DatabaseAlreadyOpen) if attempt < OPEN_ATTEMPTS => {
                    debug!(path = ?self.path, attempt, "overlay store locked, retrying");
                    std::thread::sleep(OPEN_RETRY_DELAY);
                    attempt += 1;
                }
                Err(e) => return Err(StateError::Open(e.to_string())),
            }
        }
    }
}

impl OverlayStore for FileStore {
    fn put(&self, name: &str, config: &OverlayConfig) -> StateResult<()> {
        self.connect()?.put(name, config)
    }

    fn get(&self, name: &str) -> StateResult<Option<OverlayConfig>> {
        self.connect()?.get(name)
    }

    fn get_all(&self) -> StateResult<BTreeMap<String, OverlayConfig>> {
        self.connect()?.get_all()
    }

    fn delete(&self, name: &str) -> StateResult<()> {
        self.connect()?.delete(name)
    }
}
