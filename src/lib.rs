// Deli Counter - Rust Implementation
// Small, stable, reusable slot numbers for long opaque identifiers

#![warn(rust_2018_idioms)]

pub mod allocator;
pub mod config;
pub mod metrics;
pub mod oracle;
pub mod store;
pub mod telemetry;
pub mod ticket;

// Re-exports for convenience
pub use allocator::{Assignment, AssignmentKind, SlotAllocator};
pub use config::{AllocatorConfig, GrowthPolicy, OverflowPolicy};
pub use oracle::{ActiveSet, ActivityOracle, FnOracle, PredicateOracle};
pub use store::{JsonFileStore, MemoryStore, SlotStore};
pub use ticket::{ItemId, Slot, Ticket};

/// Deli counter error types
pub mod error {
    use crate::ticket::{ItemId, Slot};
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Storage error: {0}")]
        Storage(String),

        #[error("Item already has a ticket: {0}")]
        DuplicateItem(ItemId),

        #[error("Slot already taken: {0}")]
        SlotTaken(Slot),

        #[error("Namespace not found: {0}")]
        NamespaceNotFound(String),

        #[error("Activity oracle error: {0}")]
        Oracle(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

        #[error("Capacity exhausted: no free slot in 1..={capacity}")]
        CapacityExhausted { capacity: u64 },

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Serialization error: {0}")]
        SerializationError(String),

        #[error("Configuration error: {0}")]
        Config(String),
    }

    impl Error {
        /// Wrap a failure reported by an activity oracle
        pub fn oracle(err: anyhow::Error) -> Self {
            Error::Oracle(err.into())
        }

        /// Whether this error is a store-level constraint violation
        pub fn is_conflict(&self) -> bool {
            matches!(self, Error::DuplicateItem(_) | Error::SlotTaken(_))
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
