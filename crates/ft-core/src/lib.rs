//! # ft-core
//!
//! Core types, traits, and utilities for fieldtime.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types and the field-keyed validation error collection
//! - Result type alias
//! - Shared value types (geolocation, quarter-hour quantization)
//! - Configuration loading

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::*;
pub use result::*;
pub use types::*;
