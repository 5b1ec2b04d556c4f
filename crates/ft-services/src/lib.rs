//! # ft-services
//!
//! Application service layer: one facade per aggregate, composing the
//! submission contract, the durable queue, the sync engine, the remote
//! gateway, and the revision ledger into the operations callers use.

pub mod time_periods;

pub use time_periods::*;
