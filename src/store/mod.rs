//! Ticket storage layer
//!
//! # Architecture
//!
//! The allocator never talks to a backend directly. Every read and write goes
//! through the [`SlotStore`] trait:
//!
//! ```text
//! SlotAllocator
//!   └─→ SlotStore (find, list, count, insert, delete, bulk delete, clear)
//!        ├─→ MemoryStore    (TicketTable behind a lock)
//!        └─→ JsonFileStore  (<dir>/<namespace>.json, TicketTable per call)
//! ```
//!
//! Both bundled stores keep their tickets in a [`TicketTable`], which enforces
//! the two uniqueness constraints: one ticket per item, one item per slot.

pub mod engine;
pub mod file;
pub mod memory;
pub mod table;

pub use engine::SlotStore;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use table::TicketTable;
