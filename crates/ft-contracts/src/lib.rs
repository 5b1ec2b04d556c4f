//! # ft-contracts
//!
//! Input validation and normalization for time period submissions.
//!
//! The contract turns a flat captured input (one date, one pair of times,
//! zero-or-more breaks, fleet references, pay-rate values, allowances) into
//! a normalized [`ft_models::TimePeriod`] aggregate, enforcing every
//! invariant before anything touches storage. Contracts never talk to
//! storage themselves.

pub mod input;
pub mod submit;

pub use input::*;
pub use submit::*;
