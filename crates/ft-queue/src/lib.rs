//! # ft-queue
//!
//! Local durable queue for pending time period submissions. Entries are
//! persisted with their full child snapshot when the remote store is
//! unreachable and survive process restarts. The queue is fatal-free: its
//! only failure mode is storage exhaustion, which is surfaced, never
//! silently dropped.

pub mod entry;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use entry::*;
pub use memory::*;
pub use sqlite::*;
pub use store::*;
