//! In-memory gateway fake.
//!
//! Models the behaviors the core depends on: idempotent create by client
//! id, conditional status transitions under a lock, code-to-id reference
//! resolution, and an offline switch for exercising transient-failure
//! paths in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use ft_models::{Actor, RefKind, RefSource, TimePeriod, TimePeriodId, WorkflowStatus};
use ft_models::status::TransitionError;

use crate::gateway::{GatewayError, GatewayResult, RemoteGateway};

#[derive(Default)]
pub struct MemoryGateway {
    rows: Mutex<HashMap<TimePeriodId, TimePeriod>>,
    references: DashMap<(RefKind, String), Uuid>,
    offline: AtomicBool,
    fail_creates: AtomicU32,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolvable project/plant code.
    pub fn register_reference(&self, kind: RefKind, code: impl Into<String>, id: Uuid) {
        self.references.insert((kind, code.into()), id);
    }

    /// While offline, every call fails with a transient error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `n` create calls with a transient error.
    pub fn fail_next_creates(&self, n: u32) {
        self.fail_creates.store(n, Ordering::SeqCst);
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn row(&self, id: TimePeriodId) -> Option<TimePeriod> {
        self.rows.lock().get(&id).cloned()
    }

    fn check_online(&self) -> GatewayResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Transient("remote store unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn create_time_period(&self, period: &TimePeriod) -> GatewayResult<()> {
        self.check_online()?;
        if self
            .fail_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(GatewayError::Transient("simulated create failure".into()));
        }

        // A dangling code reference would violate referential integrity.
        if let Some(work_ref) = &period.work_ref {
            if matches!(work_ref.source(), RefSource::Code(_)) {
                return Err(GatewayError::Conflict(format!(
                    "unresolved {} reference on {}",
                    work_ref.kind().as_str(),
                    period.id
                )));
            }
        }

        // Idempotent by client id: re-submission replaces, never duplicates.
        self.rows.lock().insert(period.id, period.clone());
        Ok(())
    }

    async fn update_time_period(&self, period: &TimePeriod, actor: &Actor) -> GatewayResult<()> {
        self.check_online()?;
        let mut rows = self.rows.lock();
        let current = rows
            .get(&period.id)
            .ok_or(GatewayError::NotFound(period.id))?;
        if !current
            .status
            .may_edit(actor.role, current.owned_by(actor.id))
        {
            return Err(GatewayError::Unauthorized(format!(
                "actor {} may not edit {} at stage {}",
                actor.id,
                period.id,
                current.status.as_str()
            )));
        }
        rows.insert(period.id, period.clone());
        Ok(())
    }

    async fn fetch_time_period(&self, id: TimePeriodId) -> GatewayResult<Option<TimePeriod>> {
        self.check_online()?;
        Ok(self.rows.lock().get(&id).cloned())
    }

    async fn transition_status(
        &self,
        id: TimePeriodId,
        expected: WorkflowStatus,
        new: WorkflowStatus,
        actor: &Actor,
    ) -> GatewayResult<()> {
        self.check_online()?;
        // Role and shape checks first; they do not depend on current state.
        WorkflowStatus::check_transition(expected, new, actor.role).map_err(|e| match e {
            TransitionError::RoleNotPermitted { .. } => GatewayError::Unauthorized(e.to_string()),
            _ => GatewayError::Conflict(e.to_string()),
        })?;

        // Conditional write: compare and set under the row lock.
        let mut rows = self.rows.lock();
        let row = rows.get_mut(&id).ok_or(GatewayError::NotFound(id))?;
        if row.status != expected {
            return Err(GatewayError::StatusConflict {
                id,
                expected,
                actual: row.status,
            });
        }
        row.status = new;
        Ok(())
    }

    async fn resolve_reference(&self, kind: RefKind, code: &str) -> GatewayResult<Uuid> {
        self.check_online()?;
        self.references
            .get(&(kind, code.to_string()))
            .map(|entry| *entry.value())
            .ok_or_else(|| GatewayError::ReferenceNotFound {
                kind,
                code: code.to_string(),
            })
    }
}
