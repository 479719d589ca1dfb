//! In-memory slot store
//!
//! Tickets live in a [`TicketTable`] behind a lock. Cloning the store hands
//! out another handle to the same tickets.

use super::engine::SlotStore;
use super::table::TicketTable;
use crate::error::Result;
use crate::ticket::{ItemId, Ticket};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// In-memory ticket store
#[derive(Clone, Default)]
pub struct MemoryStore {
    table: Arc<Mutex<TicketTable>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("tickets", &self.len())
            .finish()
    }
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with tickets
    pub fn with_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Result<Self> {
        Ok(Self {
            table: Arc::new(Mutex::new(TicketTable::from_tickets(tickets)?)),
        })
    }

    /// Get the number of tickets stored
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Snapshot of all tickets, ordered by slot
    pub fn snapshot(&self) -> Vec<Ticket> {
        self.table.lock().tickets()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn find_by_item(&self, item: &ItemId) -> Result<Option<Ticket>> {
        Ok(self.table.lock().get(item))
    }

    async fn list_all(&self) -> Result<Vec<Ticket>> {
        Ok(self.table.lock().tickets())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.lock().len())
    }

    async fn insert(&self, ticket: Ticket) -> Result<()> {
        self.table.lock().insert(ticket)
    }

    async fn delete_by_item(&self, item: &ItemId) -> Result<usize> {
        Ok(self.table.lock().remove(item).map_or(0, |_| 1))
    }

    async fn delete_where_item_not_in(&self, active: &HashSet<ItemId>) -> Result<usize> {
        Ok(self.table.lock().retain_items(active))
    }

    async fn clear(&self) -> Result<()> {
        self.table.lock().clear();
        Ok(())
    }
}
