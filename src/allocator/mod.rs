//! Slot allocator
//!
//! Hands out small positive slot numbers for opaque items, like taking a
//! number at a deli counter.
//!
//! # Policy
//!
//! ```text
//! add(item)
//!   ├─→ item already ticketed          → same slot again
//!   ├─→ tickets < capacity             → grow (GrowthPolicy)
//!   └─→ tickets >= capacity
//!        ├─→ reclaim: ask the ActivityOracle which items are still active,
//!        │            evict tickets for the rest
//!        ├─→ free slot in 1..=capacity → lowest one
//!        └─→ none                      → overflow (OverflowPolicy)
//! ```
//!
//! # Concurrency
//!
//! Every public operation holds the allocator's operation lock for its whole
//! read-then-write sequence, so operations on one allocator never interleave.
//! Separate allocators sharing one store are not coordinated with each other.
//! The bundled stores serialize each store call and reject a duplicate slot
//! on insert instead of storing it, so the loser sees `Error::SlotTaken`.
//! For `JsonFileStore` that holds for every handle within one process.

pub mod occupancy;

pub use occupancy::Occupancy;

use crate::config::{AllocatorConfig, GrowthPolicy, OverflowPolicy};
use crate::error::{Error, Result};
use crate::metrics;
use crate::oracle::ActivityOracle;
use crate::store::{MemoryStore, SlotStore};
use crate::ticket::{ItemId, Slot, Ticket};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// How a slot came to be assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentKind {
    /// The item already held this slot
    Existing,
    /// New slot within capacity, nothing evicted
    Fresh,
    /// New slot within capacity after reclamation evicted stale tickets
    Reclaimed,
    /// New slot above capacity
    Overflow,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::Existing => "existing",
            AssignmentKind::Fresh => "fresh",
            AssignmentKind::Reclaimed => "reclaimed",
            AssignmentKind::Overflow => "overflow",
        }
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`SlotAllocator::assign`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub slot: Slot,
    pub kind: AssignmentKind,
}

impl Assignment {
    /// Whether a new ticket was created
    pub fn is_new(&self) -> bool {
        self.kind != AssignmentKind::Existing
    }

    pub fn is_overflow(&self) -> bool {
        self.kind == AssignmentKind::Overflow
    }
}

/// Deli counter slot allocator
pub struct SlotAllocator {
    store: Arc<dyn SlotStore>,
    oracle: Option<Arc<dyn ActivityOracle>>,
    config: AllocatorConfig,
    /// Held for the duration of one logical operation
    op_lock: Mutex<()>,
}

impl fmt::Debug for SlotAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotAllocator")
            .field("config", &self.config)
            .field("has_oracle", &self.oracle.is_some())
            .finish()
    }
}

impl SlotAllocator {
    /// Create an allocator over `store`
    pub fn new<S: SlotStore + 'static>(store: S, config: AllocatorConfig) -> Result<Self> {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create an allocator over a store handle shared with other code
    pub fn with_shared_store(store: Arc<dyn SlotStore>, config: AllocatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            oracle: None,
            config,
            op_lock: Mutex::new(()),
        })
    }

    /// In-memory allocator with the given capacity and default settings
    pub fn in_memory(capacity: u64) -> Result<Self> {
        Self::new(
            MemoryStore::new(),
            AllocatorConfig::default().with_capacity(capacity),
        )
    }

    /// Use `oracle` to decide which tickets survive reclamation
    pub fn with_oracle<O: ActivityOracle + 'static>(self, oracle: O) -> Self {
        self.with_shared_oracle(Arc::new(oracle))
    }

    pub fn with_shared_oracle(mut self, oracle: Arc<dyn ActivityOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SlotStore> {
        &self.store
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Take a number: return the item's slot, assigning one if needed
    pub async fn add(&self, item: impl Into<ItemId>) -> Result<Slot> {
        Ok(self.assign(item).await?.slot)
    }

    /// Like [`add`](Self::add), but also reports how the slot was obtained
    pub async fn assign(&self, item: impl Into<ItemId>) -> Result<Assignment> {
        self.assign_item(item.into()).await
    }

    #[instrument(level = "debug", skip(self), fields(namespace = %self.config.namespace))]
    async fn assign_item(&self, item: ItemId) -> Result<Assignment> {
        let _guard = self.op_lock.lock().await;

        if let Some(ticket) = self.store.find_by_item(&item).await? {
            debug!(slot = ticket.slot, "Item already holds a slot");
            metrics::record_assignment(AssignmentKind::Existing);
            return Ok(Assignment {
                slot: ticket.slot,
                kind: AssignmentKind::Existing,
            });
        }

        let capacity = self.config.capacity;
        let mut tickets = self.store.list_all().await?;

        let (slot, kind) = if (tickets.len() as u64) < capacity {
            let occupancy = Occupancy::from_tickets(&tickets);
            (self.growth_slot(&occupancy), AssignmentKind::Fresh)
        } else {
            let evicted = self.reclaim_tickets(&mut tickets).await?;
            let occupancy = Occupancy::from_tickets(&tickets);

            match occupancy.lowest_free_within(capacity) {
                Some(slot) if evicted > 0 => (slot, AssignmentKind::Reclaimed),
                Some(slot) => (slot, AssignmentKind::Fresh),
                None => match self.config.overflow {
                    OverflowPolicy::Extend => {
                        let slot = occupancy.lowest_free();
                        warn!(slot, capacity, "No free slot within capacity, extending past it");
                        (slot, AssignmentKind::Overflow)
                    }
                    OverflowPolicy::Reject => {
                        warn!(capacity, "No free slot within capacity, rejecting item");
                        return Err(Error::CapacityExhausted { capacity });
                    }
                },
            }
        };

        self.store.insert(Ticket { item, slot }).await?;

        metrics::record_assignment(kind);
        debug!(slot, kind = %kind, "Assigned slot");
        Ok(Assignment { slot, kind })
    }

    /// Slot for a new ticket while below capacity
    fn growth_slot(&self, occupancy: &Occupancy) -> Slot {
        match self.config.growth {
            GrowthPolicy::LowestFree => occupancy.lowest_free(),
            GrowthPolicy::Append => {
                let highest = occupancy.highest();
                if highest < self.config.capacity {
                    highest + 1
                } else {
                    occupancy.lowest_free()
                }
            }
        }
    }

    /// Evict tickets whose items the oracle no longer reports as active.
    ///
    /// `tickets` is pruned to the survivors. Returns how many were evicted.
    async fn reclaim_tickets(&self, tickets: &mut Vec<Ticket>) -> Result<usize> {
        let Some(oracle) = &self.oracle else {
            debug!("No activity oracle configured, skipping reclamation");
            return Ok(0);
        };

        let items: Vec<ItemId> = tickets.iter().map(|t| t.item.clone()).collect();
        let active: HashSet<ItemId> = oracle.active(&items).await.map_err(Error::oracle)?;

        let deleted = self.store.delete_where_item_not_in(&active).await?;

        let checked = tickets.len();
        tickets.retain(|t| active.contains(&t.item));
        let evicted = checked - tickets.len();

        info!(checked, evicted, deleted, "Reclamation pass finished");
        metrics::record_reclaim(evicted);
        Ok(evicted)
    }

    /// Give back the item's slot. Returns whether the item held one.
    #[instrument(level = "debug", skip(self, item), fields(namespace = %self.config.namespace))]
    pub async fn remove(&self, item: impl Into<ItemId>) -> Result<bool> {
        let item = item.into();
        let _guard = self.op_lock.lock().await;

        let found = self.store.delete_by_item(&item).await? > 0;
        debug!(item = %item, found, "Removed item");
        metrics::record_removal(found);
        Ok(found)
    }

    /// Current slot of `item`, without assigning one
    pub async fn lookup(&self, item: impl Into<ItemId>) -> Result<Option<Slot>> {
        let item = item.into();
        let _guard = self.op_lock.lock().await;
        Ok(self.store.find_by_item(&item).await?.map(|t| t.slot))
    }

    /// All live tickets, ordered by slot
    pub async fn tickets(&self) -> Result<Vec<Ticket>> {
        let _guard = self.op_lock.lock().await;
        let mut tickets = self.store.list_all().await?;
        tickets.sort_by_key(|t| t.slot);
        Ok(tickets)
    }

    /// Number of live tickets
    pub async fn len(&self) -> Result<usize> {
        let _guard = self.op_lock.lock().await;
        self.store.count().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Run one reclamation pass now, regardless of the ticket count.
    /// Without an oracle this evicts nothing.
    #[instrument(level = "debug", skip(self), fields(namespace = %self.config.namespace))]
    pub async fn reclaim(&self) -> Result<usize> {
        let _guard = self.op_lock.lock().await;
        let mut tickets = self.store.list_all().await?;
        self.reclaim_tickets(&mut tickets).await
    }

    /// Drop every ticket. A namespace that doesn't exist yet counts as empty.
    #[instrument(level = "debug", skip(self), fields(namespace = %self.config.namespace))]
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        match self.store.clear().await {
            Ok(()) => {}
            Err(Error::NamespaceNotFound(namespace)) => {
                debug!(namespace = %namespace, "Nothing to reset");
            }
            Err(e) => return Err(e),
        }

        info!("Counter reset");
        Ok(())
    }
}
