//! # ft-revisions
//!
//! Append-only revision ledger. Every accepted mutation of a time period
//! (the original submission included) is captured as immutable
//! field-level records. The ledger is a read-only audit trail: current
//! state always lives on the aggregate, never reconstructed from here.

pub mod diff;
pub mod ledger;
pub mod record;

pub use diff::*;
pub use ledger::*;
pub use record::*;
