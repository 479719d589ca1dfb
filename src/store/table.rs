//! Two-way ticket index shared by the bundled stores

use crate::error::{Error, Result};
use crate::ticket::{ItemId, Slot, Ticket};
use std::collections::{BTreeMap, HashMap, HashSet};

/// In-memory ticket index
///
/// Keeps `item → slot` for lookups and `slot → item` ordered by slot, and
/// refuses inserts that would break either uniqueness constraint.
#[derive(Debug, Clone, Default)]
pub struct TicketTable {
    by_item: HashMap<ItemId, Slot>,
    by_slot: BTreeMap<Slot, ItemId>,
}

impl TicketTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from persisted tickets, checking constraints
    pub fn from_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Result<Self> {
        let mut table = Self::new();
        for ticket in tickets {
            table.insert(ticket)?;
        }
        Ok(table)
    }

    pub fn get(&self, item: &ItemId) -> Option<Ticket> {
        self.by_item.get(item).map(|&slot| Ticket {
            item: item.clone(),
            slot,
        })
    }

    /// All tickets in ascending slot order
    pub fn tickets(&self) -> Vec<Ticket> {
        self.by_slot
            .iter()
            .map(|(&slot, item)| Ticket {
                item: item.clone(),
                slot,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }

    pub fn insert(&mut self, ticket: Ticket) -> Result<()> {
        if ticket.slot == 0 {
            return Err(Error::InvalidArgument(format!(
                "slot must be positive for item {}",
                ticket.item
            )));
        }
        if self.by_item.contains_key(&ticket.item) {
            return Err(Error::DuplicateItem(ticket.item));
        }
        if self.by_slot.contains_key(&ticket.slot) {
            return Err(Error::SlotTaken(ticket.slot));
        }

        self.by_slot.insert(ticket.slot, ticket.item.clone());
        self.by_item.insert(ticket.item, ticket.slot);
        Ok(())
    }

    pub fn remove(&mut self, item: &ItemId) -> Option<Slot> {
        let slot = self.by_item.remove(item)?;
        self.by_slot.remove(&slot);
        Some(slot)
    }

    /// Keep only tickets whose item is in `active`; returns how many were dropped
    pub fn retain_items(&mut self, active: &HashSet<ItemId>) -> usize {
        let before = self.by_item.len();
        self.by_item.retain(|item, _| active.contains(item));
        self.by_slot.retain(|_, item| active.contains(item));
        before - self.by_item.len()
    }

    pub fn clear(&mut self) {
        self.by_item.clear();
        self.by_slot.clear();
    }
}
