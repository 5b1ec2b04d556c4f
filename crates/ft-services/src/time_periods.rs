//! Time period service facade.
//!
//! Submission is queue-first: every aggregate lands in the durable queue
//! before any network attempt, so a dead connection and a healthy one
//! take the same code path and differ only in when the drain succeeds.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use ft_contracts::{SubmitTimePeriodContract, TimePeriodInput};
use ft_core::config::FieldtimeConfig;
use ft_core::error::CoreError;
use ft_core::result::FtResult;
use ft_models::{Actor, TimePeriod, TimePeriodId, WorkflowStatus};
use ft_queue::{QueueEntry, QueueEntryState, QueueError, QueueStore};
use ft_revisions::{diff_periods, RevisionError, RevisionLedger, RevisionRecord, RevisionStore};
use ft_sync::{RemoteGateway, SyncEngine, SyncReport};

/// Where a submission landed after the immediate drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Accepted by the remote store during this call.
    Synced,
    /// Queued durably; a later drain will deliver it.
    Queued,
    /// Rejected permanently during the immediate drain. The entry stays
    /// listed under [`TimePeriodService::stuck_submissions`] until it is
    /// resolved or discarded.
    Stuck,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub id: TimePeriodId,
    pub status: SubmitStatus,
}

impl SubmitOutcome {
    pub fn is_synced(&self) -> bool {
        self.status == SubmitStatus::Synced
    }
}

/// Result of an edit batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    /// Revision number after the edit. Unchanged for a no-op batch.
    pub revision_number: i32,
    /// Ledger records appended for this batch. Zero means nothing
    /// actually changed.
    pub recorded_changes: usize,
    /// The record was still in the local queue; the edit replaced its
    /// snapshot instead of touching the remote store.
    pub updated_locally: bool,
}

/// Facade over the full submission and approval pipeline for one device.
pub struct TimePeriodService {
    queue: Arc<dyn QueueStore>,
    gateway: Arc<dyn RemoteGateway>,
    ledger: Arc<RevisionLedger>,
    engine: SyncEngine,
    contract: SubmitTimePeriodContract,
}

impl TimePeriodService {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        gateway: Arc<dyn RemoteGateway>,
        revisions: Arc<dyn RevisionStore>,
        config: &FieldtimeConfig,
    ) -> Self {
        let ledger = Arc::new(RevisionLedger::new(revisions));
        let engine = SyncEngine::new(
            queue.clone(),
            gateway.clone(),
            ledger.clone(),
            config.sync.clone(),
        );
        Self {
            queue,
            gateway,
            ledger,
            engine,
            contract: SubmitTimePeriodContract::new(config.limits.clone()),
        }
    }

    /// Validate and submit a new time period for the acting user.
    ///
    /// The aggregate is enqueued durably first and a drain pass runs
    /// immediately. The outcome distinguishes remote acceptance from a
    /// record left queued (unreachable store) and from a permanent
    /// rejection parked as stuck.
    #[instrument(skip_all, fields(user = %actor.id))]
    pub async fn submit(&self, actor: &Actor, input: TimePeriodInput) -> FtResult<SubmitOutcome> {
        let mut period = self.contract.build(actor.id, input)?;
        let id = period.id;

        self.queue.enqueue(&period).await.map_err(queue_err)?;
        self.engine.drain().await?;

        // Classify by the entry's post-drain state; only removal from the
        // queue means the remote store accepted it.
        let status = match self.queue.get(id).await.map_err(queue_err)? {
            None => SubmitStatus::Synced,
            Some(entry) if entry.state == QueueEntryState::Stuck => {
                warn!(
                    %id,
                    reason = entry.last_error.as_deref().unwrap_or("unknown"),
                    "submission rejected during immediate sync"
                );
                SubmitStatus::Stuck
            }
            Some(entry) => {
                if entry.state == QueueEntryState::Pending {
                    // Still queued, so this capture happened offline.
                    period.offline_created = true;
                    self.queue.enqueue(&period).await.map_err(queue_err)?;
                }
                info!(%id, "submission queued for later sync");
                SubmitStatus::Queued
            }
        };
        Ok(SubmitOutcome { id, status })
    }

    /// Run one drain pass against the remote store.
    pub async fn force_sync(&self) -> FtResult<SyncReport> {
        self.engine.drain().await
    }

    /// Startup recovery: release claims left by an interrupted drain.
    pub async fn recover(&self) -> FtResult<u64> {
        self.engine.recover_interrupted().await
    }

    /// Advance a record to the next approval stage.
    ///
    /// The transition is conditional on the status observed here, so a
    /// concurrent reviewer racing this call gets a conflict, never a
    /// double approval.
    #[instrument(skip_all, fields(%id, reviewer = %actor.id))]
    pub async fn approve(&self, id: TimePeriodId, actor: &Actor) -> FtResult<WorkflowStatus> {
        let current = self.fetch_required(id).await?;
        let next = current.status.next().ok_or_else(|| {
            CoreError::conflict(format!("{id} is already at the final approval stage"))
        })?;
        self.gateway
            .transition_status(id, current.status, next, actor)
            .await?;
        info!(from = current.status.as_str(), to = next.as_str(), "approved");
        Ok(next)
    }

    /// Apply an edit batch: the full input replaces the record's fields
    /// and child collections wholesale.
    ///
    /// A record still waiting in the local queue is edited in place with
    /// no revision records; the eventual sync records the final shape as
    /// the original submission. A synced record is updated remotely and
    /// every changed field lands in the ledger under one bumped revision
    /// number. An edit that changes nothing writes nothing.
    #[instrument(skip_all, fields(%id, editor = %actor.id))]
    pub async fn edit(
        &self,
        id: TimePeriodId,
        actor: &Actor,
        input: TimePeriodInput,
        reason: Option<String>,
    ) -> FtResult<EditOutcome> {
        if let Some(entry) = self.queued_entry(id).await? {
            return self.edit_queued(entry, actor, input).await;
        }

        let current = self.fetch_required(id).await?;
        if !current.status.may_edit(actor.role, current.owned_by(actor.id)) {
            return Err(CoreError::Unauthorized {
                message: format!(
                    "may not edit a record at stage {}",
                    current.status.as_str()
                ),
            });
        }

        let mut candidate = self.contract.build(current.user_id, input)?;
        carry_identity(&mut candidate, &current);

        if diff_periods(&current, &candidate).is_empty() {
            return Ok(EditOutcome {
                revision_number: current.revision_number,
                recorded_changes: 0,
                updated_locally: false,
            });
        }

        candidate.revision_number = current.revision_number + 1;
        self.gateway.update_time_period(&candidate, actor).await?;
        let records = self
            .ledger
            .record_edit(&current, &candidate, actor, reason)
            .await
            .map_err(revision_err)?;
        info!(
            revision = candidate.revision_number,
            changes = records.len(),
            "edit applied"
        );
        Ok(EditOutcome {
            revision_number: candidate.revision_number,
            recorded_changes: records.len(),
            updated_locally: false,
        })
    }

    /// Audit trail for one aggregate, newest first.
    pub async fn revision_history(&self, id: TimePeriodId) -> FtResult<Vec<RevisionRecord>> {
        self.ledger.history(id).await.map_err(revision_err)
    }

    pub async fn fetch(&self, id: TimePeriodId) -> FtResult<Option<TimePeriod>> {
        Ok(self.gateway.fetch_time_period(id).await?)
    }

    /// Submissions still waiting to reach the remote store.
    pub async fn pending_count(&self) -> FtResult<u64> {
        self.queue.pending_count().await.map_err(queue_err)
    }

    /// Submissions that failed permanently and need manual attention.
    pub async fn stuck_submissions(&self) -> FtResult<Vec<QueueEntry>> {
        self.queue.stuck_entries().await.map_err(queue_err)
    }

    /// Drop a stuck submission after manual review.
    pub async fn discard_stuck(&self, id: TimePeriodId) -> FtResult<bool> {
        self.queue.discard(id).await.map_err(queue_err)
    }

    async fn edit_queued(
        &self,
        entry: QueueEntry,
        actor: &Actor,
        input: TimePeriodInput,
    ) -> FtResult<EditOutcome> {
        let current = entry.period;
        if !current.status.may_edit(actor.role, current.owned_by(actor.id)) {
            return Err(CoreError::Unauthorized {
                message: "may not edit this queued record".into(),
            });
        }

        let mut candidate = self.contract.build(current.user_id, input)?;
        carry_identity(&mut candidate, &current);
        // Replaces the snapshot; queue position and retries are kept.
        self.queue.enqueue(&candidate).await.map_err(queue_err)?;
        info!(id = %current.id, "queued snapshot replaced");
        Ok(EditOutcome {
            revision_number: current.revision_number,
            recorded_changes: 0,
            updated_locally: true,
        })
    }

    async fn queued_entry(&self, id: TimePeriodId) -> FtResult<Option<QueueEntry>> {
        let pending = self.queue.list_pending().await.map_err(queue_err)?;
        Ok(pending.into_iter().find(|e| e.id() == id))
    }

    async fn fetch_required(&self, id: TimePeriodId) -> FtResult<TimePeriod> {
        self.gateway
            .fetch_time_period(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "time_period",
                key: id.to_string(),
            })
    }
}

/// Keep the stable parts of the aggregate across a rebuilt edit input.
fn carry_identity(candidate: &mut TimePeriod, current: &TimePeriod) {
    candidate.id = current.id;
    candidate.offline_created = current.offline_created;
    candidate.synced = current.synced;
    candidate.status = current.status;
    candidate.revision_number = current.revision_number;
    candidate.submitted_at = current.submitted_at;
    candidate.submitted_by = current.submitted_by;
}

fn queue_err(e: QueueError) -> CoreError {
    CoreError::Storage(e.to_string())
}

fn revision_err(e: RevisionError) -> CoreError {
    CoreError::Storage(e.to_string())
}
