//! # forma-store
//!
//! In-memory implementation of the Forma store collaborator.
//!
//! `MemoryStore` keeps one ordered table per entity kind, assigns integer keys
//! to records saved without one, journals every committed write, and runs
//! transactions by snapshotting its tables and restoring them when the unit of
//! work fails. Nested transactions join the outermost one.

pub mod journal;
mod memory;

pub use journal::{StoreOp, StoreOperation};
pub use memory::MemoryStore;
