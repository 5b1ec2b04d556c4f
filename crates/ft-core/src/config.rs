//! Configuration types and loading.
//!
//! Layering: compiled defaults, then an optional `fieldtime.toml`, then
//! `FT_`-prefixed environment variables (e.g. `FT_SYNC__MAX_RETRIES=5`).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldtimeConfig {
    /// UI-facing child-collection limits enforced at validation time.
    pub limits: Limits,
    /// Sync engine behavior.
    pub sync: SyncConfig,
    /// Local durable queue storage.
    pub queue: QueueConfig,
}

/// Child-collection limits. These are UI-facing maxima, not schema
/// cardinality: storage is unbounded per aggregate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    pub max_breaks: usize,
    pub max_used_fleet: usize,
    pub max_mobilised_fleet: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_breaks: 3,
            max_used_fleet: 6,
            max_mobilised_fleet: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Transient-failure retries before an entry is marked stuck.
    pub max_retries: u32,
    /// Bounded concurrency for independent aggregates.
    pub max_concurrent: usize,
    /// Base delay for exponential backoff.
    pub backoff_base_ms: u64,
    /// Upper bound on a single backoff delay.
    pub backoff_cap_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_concurrent: 4,
            backoff_base_ms: 500,
            backoff_cap_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// SQLite database path for the durable queue.
    pub database_path: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            database_path: "fieldtime-queue.db".to_string(),
        }
    }
}

impl FieldtimeConfig {
    /// Load configuration from `fieldtime.toml` (optional) and `FT_` env vars.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from("fieldtime")
    }

    /// Load from a named config file base (without extension).
    pub fn load_from(basename: &str) -> Result<Self, CoreError> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();

        config::Config::builder()
            .add_source(config::File::with_name(basename).required(false))
            .add_source(config::Environment::with_prefix("FT").separator("__"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FieldtimeConfig::default();
        assert_eq!(config.limits.max_breaks, 3);
        assert_eq!(config.sync.max_retries, 5);
        assert_eq!(config.sync.max_concurrent, 4);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = FieldtimeConfig::load_from("no-such-config-file").unwrap();
        assert_eq!(config.limits.max_used_fleet, 6);
        assert_eq!(config.queue.database_path, "fieldtime-queue.db");
    }
}
