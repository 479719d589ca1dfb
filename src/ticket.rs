//! Tickets: the item ↔ slot records handed out by the counter
//!
//! A ticket is persisted as `{ "item": <id>, "slot": <n> }` where the item is
//! either a string or an integer token.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot number handed out for an item (always >= 1)
pub type Slot = u64;

/// Opaque identifier supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl ItemId {
    /// Get the identifier as a string slice, if it is textual
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ItemId::Text(s) => Some(s),
            ItemId::Number(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Text(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::Text(s)
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        ItemId::Number(n)
    }
}

impl From<i32> for ItemId {
    fn from(n: i32) -> Self {
        ItemId::Number(n as i64)
    }
}

/// The persisted item ↔ slot association
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub item: ItemId,
    pub slot: Slot,
}

impl Ticket {
    /// Create a new ticket
    pub fn new(item: impl Into<ItemId>, slot: Slot) -> Self {
        Self {
            item: item.into(),
            slot,
        }
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket(item={}, slot={})", self.item, self.slot)
    }
}
