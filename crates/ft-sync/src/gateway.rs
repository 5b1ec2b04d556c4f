//! Remote store gateway seam.
//!
//! The authoritative relational store sits behind its own access-control
//! layer; the core treats it as a transactional but network-fallible
//! service. Row-level authorization is an opaque external policy: the
//! core never replicates it client-side and reacts to denial as a
//! permanent failure.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use ft_core::error::CoreError;
use ft_models::{Actor, RefKind, TimePeriod, TimePeriodId, WorkflowStatus};

/// Gateway failure classification. Only `Transient` is retryable.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Network or remote-service unavailability.
    #[error("transient gateway failure: {0}")]
    Transient(String),

    /// The conditional status write found a different current status: a
    /// concurrent actor already advanced the record.
    #[error("status conflict on {id}: expected {expected:?}, found {actual:?}")]
    StatusConflict {
        id: TimePeriodId,
        expected: WorkflowStatus,
        actual: WorkflowStatus,
    },

    /// Referential-integrity or other non-status conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row-level authorization denied the operation.
    #[error("authorization denied: {0}")]
    Unauthorized(String),

    /// A logical code resolved to nothing.
    #[error("no {} found for code '{code}'", .kind.as_str())]
    ReferenceNotFound { kind: RefKind, code: String },

    #[error("time period {0} not found")]
    NotFound(TimePeriodId),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<GatewayError> for CoreError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Transient(message) => CoreError::Transient { message },
            GatewayError::StatusConflict { .. } | GatewayError::Conflict(_) => {
                CoreError::conflict(e.to_string())
            }
            GatewayError::Unauthorized(message) => CoreError::Unauthorized { message },
            GatewayError::ReferenceNotFound { kind, code } => CoreError::NotFound {
                entity: kind.as_str(),
                key: code,
            },
            GatewayError::NotFound(id) => CoreError::NotFound {
                entity: "time_period",
                key: id.to_string(),
            },
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Operations the core consumes from the remote store.
///
/// Every call is a suspension point and may race with a concurrent actor
/// (another device, another reviewer); the core never assumes exclusive
/// access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Create the aggregate root and all child rows in one logical
    /// transaction. Idempotent by the client-generated id: re-submission
    /// after a crash mid-sync updates-if-absent instead of duplicating.
    async fn create_time_period(&self, period: &TimePeriod) -> GatewayResult<()>;

    /// Replace the aggregate's fields and child collections (edit batch).
    async fn update_time_period(&self, period: &TimePeriod, actor: &Actor) -> GatewayResult<()>;

    async fn fetch_time_period(&self, id: TimePeriodId) -> GatewayResult<Option<TimePeriod>>;

    /// Conditional status write: verifies the current status equals
    /// `expected` before writing `new`, so two reviewers cannot
    /// double-approve concurrently.
    async fn transition_status(
        &self,
        id: TimePeriodId,
        expected: WorkflowStatus,
        new: WorkflowStatus,
        actor: &Actor,
    ) -> GatewayResult<()>;

    /// Resolve a logical project/plant code to its durable identifier.
    async fn resolve_reference(&self, kind: RefKind, code: &str) -> GatewayResult<Uuid>;
}
