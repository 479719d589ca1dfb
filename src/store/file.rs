//! JSON file backed slot store
//!
//! Each namespace is one file, `<dir>/<namespace>.json`, holding a JSON array
//! of tickets:
//!
//! ```text
//! [
//!   { "item": "18aeouc322348723aud", "slot": 1 },
//!   { "item": 42, "slot": 2 }
//! ]
//! ```
//!
//! Every operation re-reads the file. All handles in one process that open the
//! same namespace file share one lock, so their read-modify-write cycles never
//! interleave and a conflicting insert fails with `SlotTaken` or
//! `DuplicateItem`. Separate processes are not coordinated.
//!
//! Writes go to a per-write temp file first and are then renamed over the
//! original; a failed write removes its temp file.

use super::engine::SlotStore;
use super::table::TicketTable;
use crate::config::AllocatorConfig;
use crate::error::{Error, Result};
use crate::ticket::{ItemId, Ticket};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

lazy_static::lazy_static! {
    /// One lock per namespace file, shared by every handle in this process
    static ref FILE_LOCKS: parking_lot::Mutex<HashMap<PathBuf, Weak<Mutex<()>>>> =
        parking_lot::Mutex::new(HashMap::new());
}

/// Suffix source for temp file names
static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Lock shared by all handles on `path`
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = FILE_LOCKS.lock();
    if let Some(lock) = locks.get(path).and_then(Weak::upgrade) {
        return lock;
    }
    locks.retain(|_, lock| lock.strong_count() > 0);

    let lock = Arc::new(Mutex::new(()));
    locks.insert(path.to_path_buf(), Arc::downgrade(&lock));
    lock
}

/// File backed ticket store, one JSON file per namespace
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    namespace: String,
    /// Serializes read-modify-write cycles of every handle on `path`
    io_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the namespace file under `dir`
    pub async fn open<P: AsRef<Path>>(dir: P, namespace: &str) -> Result<Self> {
        if namespace.is_empty()
            || namespace.contains(['/', '\\'])
            || namespace == "."
            || namespace == ".."
        {
            return Err(Error::InvalidArgument(format!(
                "Invalid namespace for file store: {:?}",
                namespace
            )));
        }

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create store directory: {}", e)))?;

        let dir = tokio::fs::canonicalize(dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to resolve store directory: {}", e)))?;

        let path = dir.join(format!("{}.json", namespace));
        info!(path = ?path, namespace, "Opened file slot store");

        Ok(Self {
            io_lock: lock_for(&path),
            path,
            namespace: namespace.to_string(),
        })
    }

    /// Open the store for the namespace named in `config`
    pub async fn from_config<P: AsRef<Path>>(dir: P, config: &AllocatorConfig) -> Result<Self> {
        Self::open(dir, &config.namespace).await
    }

    /// Path of the namespace file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read the namespace file; `None` if it does not exist yet
    async fn read_table(&self) -> Result<Option<TicketTable>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(TicketTable::new()));
        }

        let tickets: Vec<Ticket> = serde_json::from_slice(&bytes).map_err(|e| {
            Error::SerializationError(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;

        TicketTable::from_tickets(tickets).map(Some)
    }

    async fn load(&self) -> Result<TicketTable> {
        Ok(self.read_table().await?.unwrap_or_default())
    }

    async fn save(&self, table: &TicketTable) -> Result<()> {
        let json = serde_json::to_vec_pretty(&table.tickets())
            .map_err(|e| Error::SerializationError(format!("Failed to encode tickets: {}", e)))?;

        let tmp_path = self.path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        ));

        let written = match tokio::fs::write(&tmp_path, &json).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &self.path)
                .await
                .map_err(|e| Error::Storage(format!("Rename failed: {}", e))),
            Err(e) => Err(Error::Storage(format!("Write failed: {}", e))),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = ?tmp_path, error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(e);
        }

        debug!(path = ?self.path, tickets = table.len(), "Saved tickets");
        Ok(())
    }
}

#[async_trait]
impl SlotStore for JsonFileStore {
    async fn find_by_item(&self, item: &ItemId) -> Result<Option<Ticket>> {
        let _guard = self.io_lock.lock().await;
        Ok(self.load().await?.get(item))
    }

    async fn list_all(&self) -> Result<Vec<Ticket>> {
        let _guard = self.io_lock.lock().await;
        Ok(self.load().await?.tickets())
    }

    async fn count(&self) -> Result<usize> {
        let _guard = self.io_lock.lock().await;
        Ok(self.load().await?.len())
    }

    async fn insert(&self, ticket: Ticket) -> Result<()> {
        let _guard = self.io_lock.lock().await;
        let mut table = self.load().await?;
        table.insert(ticket)?;
        self.save(&table).await
    }

    async fn delete_by_item(&self, item: &ItemId) -> Result<usize> {
        let _guard = self.io_lock.lock().await;
        let mut table = self.load().await?;
        if table.remove(item).is_none() {
            return Ok(0);
        }
        self.save(&table).await?;
        Ok(1)
    }

    async fn delete_where_item_not_in(&self, active: &HashSet<ItemId>) -> Result<usize> {
        let _guard = self.io_lock.lock().await;
        let mut table = self.load().await?;
        let removed = table.retain_items(active);
        if removed > 0 {
            self.save(&table).await?;
        }
        Ok(removed)
    }

    /// Delete the namespace file. Fails with `NamespaceNotFound` when there is
    /// nothing on disk for this namespace.
    async fn clear(&self) -> Result<()> {
        let _guard = self.io_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = ?self.path, "Cleared file slot store");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::NamespaceNotFound(self.namespace.clone()))
            }
            Err(e) => Err(Error::Storage(format!("Failed to clear store: {}", e))),
        }
    }
}
