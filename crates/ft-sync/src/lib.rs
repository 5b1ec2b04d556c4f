//! # ft-sync
//!
//! Remote store gateway seam and the sync engine that drains the local
//! durable queue against it: at-most-one in-flight submission per
//! aggregate identity, idempotent retry keyed by the client-generated id,
//! exponential backoff for transient failures, and a hard stop for
//! permanent rejections.

pub mod engine;
pub mod gateway;
pub mod memory_gateway;

pub use engine::*;
pub use gateway::*;
pub use memory_gateway::*;
