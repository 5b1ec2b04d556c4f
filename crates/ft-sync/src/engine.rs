//! Sync engine: drains the durable queue against the remote gateway.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use ft_core::config::SyncConfig;
use ft_core::error::CoreError;
use ft_core::result::FtResult;
use ft_models::{Actor, ActorRole, RefSource, TimePeriod, TimePeriodId};
use ft_queue::{QueueEntry, QueueEntryState, QueueError, QueueStore};
use ft_revisions::RevisionLedger;

use crate::gateway::{GatewayError, RemoteGateway};

/// Tally of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Accepted by the remote store and removed from the queue.
    pub succeeded: u64,
    /// Failed transiently; back in the queue for a later pass.
    pub retrying: u64,
    /// Retry budget exhausted or permanently rejected.
    pub stuck: u64,
    /// Already claimed by another attempt; left untouched.
    pub skipped: u64,
}

impl SyncReport {
    /// True when every listed entry reached the remote store.
    pub fn is_clean(&self) -> bool {
        self.retrying == 0 && self.stuck == 0
    }
}

enum Outcome {
    Succeeded,
    Retrying,
    Stuck,
    Skipped,
}

/// Drains pending queue entries to the remote store.
///
/// One engine instance per process; the in-flight map and the queue's own
/// claim state together guarantee at most one active submission per
/// aggregate identity even when drain passes overlap.
pub struct SyncEngine {
    queue: Arc<dyn QueueStore>,
    gateway: Arc<dyn RemoteGateway>,
    ledger: Arc<RevisionLedger>,
    config: SyncConfig,
    in_flight: DashMap<TimePeriodId, ()>,
    permits: Semaphore,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        gateway: Arc<dyn RemoteGateway>,
        ledger: Arc<RevisionLedger>,
        config: SyncConfig,
    ) -> Self {
        let permits = Semaphore::new(config.max_concurrent.max(1));
        Self {
            queue,
            gateway,
            ledger,
            config,
            in_flight: DashMap::new(),
            permits,
        }
    }

    /// One drain pass: submit every currently pending entry, bounded by
    /// `max_concurrent`. Entries enqueued during the pass are picked up by
    /// the next pass.
    pub async fn drain(&self) -> FtResult<SyncReport> {
        let pending = self.queue.list_pending().await.map_err(store_err)?;
        if pending.is_empty() {
            return Ok(SyncReport::default());
        }
        debug!(count = pending.len(), "draining pending submissions");

        let results = join_all(pending.into_iter().map(|entry| self.sync_entry(entry))).await;

        let mut report = SyncReport::default();
        for result in results {
            match result? {
                Outcome::Succeeded => report.succeeded += 1,
                Outcome::Retrying => report.retrying += 1,
                Outcome::Stuck => report.stuck += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }
        info!(
            succeeded = report.succeeded,
            retrying = report.retrying,
            stuck = report.stuck,
            "drain pass complete"
        );
        Ok(report)
    }

    /// Return entries claimed by an interrupted attempt to pending. Runs
    /// at startup: a cancelled attempt is indistinguishable from one that
    /// never started, and re-submission is idempotent either way.
    pub async fn recover_interrupted(&self) -> FtResult<u64> {
        self.in_flight.clear();
        let released = self
            .queue
            .release_all_in_flight()
            .await
            .map_err(store_err)?;
        if released > 0 {
            info!(released, "released interrupted in-flight entries");
        }
        Ok(released)
    }

    async fn sync_entry(&self, entry: QueueEntry) -> FtResult<Outcome> {
        let id = entry.id();
        match self.in_flight.entry(id) {
            Entry::Occupied(_) => return Ok(Outcome::Skipped),
            Entry::Vacant(slot) => {
                slot.insert(());
            }
        }
        let outcome = self.submit_claimed(entry).await;
        self.in_flight.remove(&id);
        outcome
    }

    async fn submit_claimed(&self, entry: QueueEntry) -> FtResult<Outcome> {
        let id = entry.id();

        // Back off before taking a permit or the store claim, so entries
        // waiting out their delay cannot starve fresh submissions.
        if entry.retry_count > 0 {
            tokio::time::sleep(self.backoff_delay(entry.retry_count)).await;
        }

        // Closed only on engine drop, which cannot race a drain.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CoreError::Transient {
                message: "sync engine shut down".into(),
            })?;

        if !self.queue.mark_in_flight(id).await.map_err(store_err)? {
            return Ok(Outcome::Skipped);
        }

        let mut period = entry.period.clone();
        if let Err(outcome) = self.resolve_work_ref(&mut period).await? {
            return Ok(outcome);
        }
        period.synced = true;

        match self.gateway.create_time_period(&period).await {
            Ok(()) => {
                // Ledger before the queue ack: a retried create is
                // idempotent, a missing audit trail is unrecoverable.
                let submitter = Actor::new(period.submitted_by, ActorRole::Worker);
                if let Err(e) = self.ledger.record_original(&period, &submitter).await {
                    warn!(%id, error = %e, "revision append failed after remote accept");
                    return self.retry_later(id, &e.to_string()).await;
                }
                self.queue.mark_synced(id).await.map_err(store_err)?;
                info!(%id, "submission accepted");
                Ok(Outcome::Succeeded)
            }
            Err(e) if e.is_retryable() => self.retry_later(id, &e.to_string()).await,
            Err(e) => {
                warn!(%id, error = %e, "submission permanently rejected");
                self.queue
                    .mark_stuck(id, &e.to_string())
                    .await
                    .map_err(store_err)?;
                Ok(Outcome::Stuck)
            }
        }
    }

    /// Resolve a code-captured work reference before first submission.
    /// A code that resolves to nothing is a permanent failure; nothing
    /// else is attempted for the entry.
    async fn resolve_work_ref(
        &self,
        period: &mut TimePeriod,
    ) -> FtResult<Result<(), Outcome>> {
        let Some(work_ref) = &period.work_ref else {
            return Ok(Ok(()));
        };
        let RefSource::Code(code) = work_ref.source() else {
            return Ok(Ok(()));
        };

        match self.gateway.resolve_reference(work_ref.kind(), code).await {
            Ok(resolved) => {
                period.work_ref = Some(work_ref.with_id(resolved));
                Ok(Ok(()))
            }
            Err(e) if e.is_retryable() => {
                Ok(Err(self.retry_later(period.id, &e.to_string()).await?))
            }
            Err(e) => {
                warn!(id = %period.id, error = %e, "work reference resolution failed");
                self.queue
                    .mark_stuck(period.id, &e.to_string())
                    .await
                    .map_err(store_err)?;
                Ok(Err(Outcome::Stuck))
            }
        }
    }

    async fn retry_later(&self, id: TimePeriodId, reason: &str) -> FtResult<Outcome> {
        let state = self
            .queue
            .mark_failed(id, reason, self.config.max_retries)
            .await
            .map_err(store_err)?;
        match state {
            QueueEntryState::Stuck => {
                warn!(%id, error = reason, "retry budget exhausted");
                Ok(Outcome::Stuck)
            }
            _ => {
                debug!(%id, error = reason, "transient failure, will retry");
                Ok(Outcome::Retrying)
            }
        }
    }

    fn backoff_delay(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.saturating_sub(1).min(16);
        let delay = self
            .config
            .backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.config.backoff_cap_ms);
        Duration::from_millis(delay)
    }
}

fn store_err(e: QueueError) -> CoreError {
    CoreError::Storage(e.to_string())
}
