//! Test stores shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use delicounter::error::{Error, Result};
use delicounter::{ItemId, MemoryStore, SlotStore, Ticket};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Unique scratch directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("delicounter_{}_{}", name, uuid::Uuid::new_v4()))
}

/// Store operations that [`FailingStore`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Find,
    List,
    Count,
    Insert,
    Delete,
    DeleteNotIn,
    Clear,
}

/// Memory store that fails chosen operations with a storage error
#[derive(Clone, Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    failing: Arc<Mutex<HashSet<Op>>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().insert(op);
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    fn check(&self, op: Op) -> Result<()> {
        if self.failing.lock().contains(&op) {
            return Err(Error::Storage(format!("injected failure on {:?}", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl SlotStore for FailingStore {
    async fn find_by_item(&self, item: &ItemId) -> Result<Option<Ticket>> {
        self.check(Op::Find)?;
        self.inner.find_by_item(item).await
    }

    async fn list_all(&self) -> Result<Vec<Ticket>> {
        self.check(Op::List)?;
        self.inner.list_all().await
    }

    async fn count(&self) -> Result<usize> {
        self.check(Op::Count)?;
        self.inner.count().await
    }

    async fn insert(&self, ticket: Ticket) -> Result<()> {
        self.check(Op::Insert)?;
        self.inner.insert(ticket).await
    }

    async fn delete_by_item(&self, item: &ItemId) -> Result<usize> {
        self.check(Op::Delete)?;
        self.inner.delete_by_item(item).await
    }

    async fn delete_where_item_not_in(&self, active: &HashSet<ItemId>) -> Result<usize> {
        self.check(Op::DeleteNotIn)?;
        self.inner.delete_where_item_not_in(active).await
    }

    async fn clear(&self) -> Result<()> {
        self.check(Op::Clear)?;
        self.inner.clear().await
    }
}

/// Memory store whose inserts wait for a permit
///
/// `arrived` is notified as soon as an insert starts waiting, so a test can
/// hold an allocation exactly between its slot scan and its write.
#[derive(Clone)]
pub struct GatedStore {
    pub inner: MemoryStore,
    pub arrived: Arc<Notify>,
    gate: Arc<Semaphore>,
}

impl GatedStore {
    /// Gate starts closed
    pub fn closed(inner: MemoryStore) -> Self {
        Self {
            inner,
            arrived: Arc::new(Notify::new()),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    /// Let `n` more inserts through
    pub fn open(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl SlotStore for GatedStore {
    async fn find_by_item(&self, item: &ItemId) -> Result<Option<Ticket>> {
        self.inner.find_by_item(item).await
    }

    async fn list_all(&self) -> Result<Vec<Ticket>> {
        self.inner.list_all().await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn insert(&self, ticket: Ticket) -> Result<()> {
        self.arrived.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| Error::Storage(format!("gate closed: {}", e)))?;
        permit.forget();
        self.inner.insert(ticket).await
    }

    async fn delete_by_item(&self, item: &ItemId) -> Result<usize> {
        self.inner.delete_by_item(item).await
    }

    async fn delete_where_item_not_in(&self, active: &HashSet<ItemId>) -> Result<usize> {
        self.inner.delete_where_item_not_in(active).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}
