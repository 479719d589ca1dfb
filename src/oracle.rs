//! Activity oracles
//!
//! During reclamation the allocator hands the oracle every ticketed item in
//! one batch and gets back the subset still in use. Tickets for the rest are
//! evicted.

use crate::ticket::ItemId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Reports which items are still active
#[async_trait]
pub trait ActivityOracle: Send + Sync {
    /// Return the subset of `items` that is still active. Anything returned
    /// that was not asked about is ignored.
    async fn active(&self, items: &[ItemId]) -> anyhow::Result<HashSet<ItemId>>;
}

/// Oracle backed by a synchronous batch closure
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&[ItemId]) -> anyhow::Result<HashSet<ItemId>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> ActivityOracle for FnOracle<F>
where
    F: Fn(&[ItemId]) -> anyhow::Result<HashSet<ItemId>> + Send + Sync,
{
    async fn active(&self, items: &[ItemId]) -> anyhow::Result<HashSet<ItemId>> {
        (self.f)(items)
    }
}

/// Oracle that checks items one at a time with a predicate
pub struct PredicateOracle<F> {
    is_active: F,
}

impl<F> PredicateOracle<F>
where
    F: Fn(&ItemId) -> bool + Send + Sync,
{
    pub fn new(is_active: F) -> Self {
        Self { is_active }
    }
}

#[async_trait]
impl<F> ActivityOracle for PredicateOracle<F>
where
    F: Fn(&ItemId) -> bool + Send + Sync,
{
    async fn active(&self, items: &[ItemId]) -> anyhow::Result<HashSet<ItemId>> {
        Ok(items
            .iter()
            .filter(|item| (self.is_active)(item))
            .cloned()
            .collect())
    }
}

/// Shared set of live items
///
/// Callers mark items active and inactive as sessions come and go; cloned
/// handles see the same set.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    items: Arc<RwLock<HashSet<ItemId>>>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_active(&self, item: impl Into<ItemId>) {
        self.items.write().insert(item.into());
    }

    /// Returns whether the item was marked active
    pub fn mark_inactive(&self, item: &ItemId) -> bool {
        self.items.write().remove(item)
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.read().contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }
}

impl<I: Into<ItemId>> FromIterator<I> for ActiveSet {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let set = Self::new();
        for item in iter {
            set.mark_active(item);
        }
        set
    }
}

#[async_trait]
impl ActivityOracle for ActiveSet {
    async fn active(&self, items: &[ItemId]) -> anyhow::Result<HashSet<ItemId>> {
        let live = self.items.read();
        Ok(items
            .iter()
            .filter(|item| live.contains(*item))
            .cloned()
            .collect())
    }
}
