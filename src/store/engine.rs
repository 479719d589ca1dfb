//! Slot store trait

use crate::error::Result;
use crate::ticket::{ItemId, Ticket};
use async_trait::async_trait;
use std::collections::HashSet;

/// Backing store for tickets
///
/// Any operation may fail with an I/O style error; the allocator propagates
/// it unchanged.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Find the ticket held by `item`
    async fn find_by_item(&self, item: &ItemId) -> Result<Option<Ticket>>;

    /// List every live ticket, ordered by slot
    async fn list_all(&self) -> Result<Vec<Ticket>>;

    /// Number of live tickets
    async fn count(&self) -> Result<usize>;

    /// Insert a ticket. Fails on a duplicate item or an occupied slot.
    async fn insert(&self, ticket: Ticket) -> Result<()>;

    /// Delete the ticket held by `item`, returning how many were deleted
    async fn delete_by_item(&self, item: &ItemId) -> Result<usize>;

    /// Delete every ticket whose item is not in `active`
    async fn delete_where_item_not_in(&self, active: &HashSet<ItemId>) -> Result<usize>;

    /// Remove all tickets
    async fn clear(&self) -> Result<()>;
}
