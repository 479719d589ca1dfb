//! Occupied-slot tracking for the allocator
//!
//! Built fresh from the store's ticket list at the start of every allocation,
//! so it never drifts from what the store holds.

use crate::ticket::{Slot, Ticket};
use std::collections::BTreeSet;

/// Set of slots held by live tickets
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    slots: BTreeSet<Slot>,
}

impl Occupancy {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        Self {
            slots: tickets.iter().map(|t| t.slot).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_occupied(&self, slot: Slot) -> bool {
        self.slots.contains(&slot)
    }

    /// Highest occupied slot, or 0 when nothing is occupied
    pub fn highest(&self) -> Slot {
        self.slots.last().copied().unwrap_or(0)
    }

    /// Smallest positive slot nobody holds. Unbounded: past the last gap this
    /// is `highest() + 1`.
    pub fn lowest_free(&self) -> Slot {
        let mut candidate: Slot = 1;
        for &slot in self.slots.range(1..) {
            if slot != candidate {
                break;
            }
            candidate += 1;
        }
        candidate
    }

    /// Smallest free slot in `1..=limit`
    pub fn lowest_free_within(&self, limit: Slot) -> Option<Slot> {
        let slot = self.lowest_free();
        (slot <= limit).then_some(slot)
    }
}
