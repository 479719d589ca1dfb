//! Allocator configuration
//!
//! Recognized options and defaults:
//!
//! ```toml
//! capacity = 100           # rollover / reclaim threshold
//! namespace = "delicounter" # where persistent stores keep their tickets
//! growth = "lowest-free"   # or "append"
//! overflow = "extend"      # or "reject"
//! ```
//!
//! The store handle and the activity oracle are code, not configuration; they
//! are handed to [`SlotAllocator`](crate::SlotAllocator) directly.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CAPACITY: u64 = 100;
pub const DEFAULT_NAMESPACE: &str = "delicounter";

/// How a new slot is picked while the ticket count is below capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthPolicy {
    /// Lowest positive slot not held by a live ticket
    #[default]
    LowestFree,
    /// One past the highest live slot until that reaches capacity, then the
    /// lowest free slot
    Append,
}

/// What happens when no slot in `1..=capacity` is free after reclamation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Hand out the lowest free slot above capacity
    #[default]
    Extend,
    /// Fail with `Error::CapacityExhausted`
    Reject,
}

/// Allocator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    /// Ticket count at which reclamation runs before a new slot is assigned
    pub capacity: u64,
    /// Namespace for persisted tickets
    pub namespace: String,
    pub growth: GrowthPolicy,
    pub overflow: OverflowPolicy,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            namespace: DEFAULT_NAMESPACE.to_string(),
            growth: GrowthPolicy::default(),
            overflow: OverflowPolicy::default(),
        }
    }
}

impl AllocatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be a positive integer".to_string()));
        }
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("namespace must not be empty".to_string()));
        }
        Ok(())
    }
}
