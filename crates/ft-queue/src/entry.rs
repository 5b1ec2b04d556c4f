//! Queue entry model and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ft_models::{TimePeriod, TimePeriodId};

/// State of a queued submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEntryState {
    /// Waiting for the next drain pass.
    Pending,
    /// Claimed by an active sync attempt.
    InFlight,
    /// Retry budget exhausted or permanent rejection; needs manual
    /// inspection. Stays visible until resolved or discarded.
    Stuck,
}

impl QueueEntryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Stuck => "stuck",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_flight" => Some(Self::InFlight),
            "stuck" => Some(Self::Stuck),
            _ => None,
        }
    }
}

/// One queued aggregate with its retry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Full aggregate snapshot, children included.
    pub period: TimePeriod,
    pub state: QueueEntryState,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn id(&self) -> TimePeriodId {
        self.period.id
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue storage error: {0}")]
    Storage(String),

    #[error("No queue entry for {0}")]
    NotFound(TimePeriodId),

    #[error("Snapshot serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for QueueError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type QueueResult<T> = Result<T, QueueError>;
