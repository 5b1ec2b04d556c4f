//! Queue store seam.

use async_trait::async_trait;

use ft_models::{TimePeriod, TimePeriodId};

use crate::entry::{QueueEntry, QueueEntryState, QueueResult};

/// Durable queue persistence. Access is synchronized by implementations so
/// an enqueue during an active drain is visible to the next drain pass,
/// never lost and never processed twice.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Persist the aggregate and all children as one logical unit. Keeps
    /// the aggregate's client-generated id; never blocks on network
    /// state. Re-enqueueing an already queued id replaces its snapshot
    /// without losing queue position or retry bookkeeping.
    async fn enqueue(&self, period: &TimePeriod) -> QueueResult<()>;

    /// Pending entries in enqueue order. Restartable: callers list again
    /// after each drain pass.
    async fn list_pending(&self) -> QueueResult<Vec<QueueEntry>>;

    /// Look up one entry regardless of its state.
    async fn get(&self, id: TimePeriodId) -> QueueResult<Option<QueueEntry>>;

    /// Claim a pending entry for submission. Returns `false` when the
    /// entry is absent or not pending, making a concurrent second claim a
    /// no-op.
    async fn mark_in_flight(&self, id: TimePeriodId) -> QueueResult<bool>;

    /// Return a claimed entry to pending, unmodified. Used when an
    /// attempt is cancelled before any remote write took effect.
    async fn release_in_flight(&self, id: TimePeriodId) -> QueueResult<()>;

    /// Return every claimed entry to pending. A cancelled attempt is
    /// equivalent to "not yet attempted", so this runs on startup after
    /// a crash or connectivity loss mid-drain.
    async fn release_all_in_flight(&self) -> QueueResult<u64>;

    /// Remove an entry after the remote store confirmed acceptance.
    async fn mark_synced(&self, id: TimePeriodId) -> QueueResult<()>;

    /// Record a transient failure: increments the retry counter and
    /// returns the entry to pending, or flips it to stuck once
    /// `max_retries` is reached. Returns the resulting state.
    async fn mark_failed(
        &self,
        id: TimePeriodId,
        reason: &str,
        max_retries: u32,
    ) -> QueueResult<QueueEntryState>;

    /// Permanent failure: mark stuck immediately, retaining the entry for
    /// manual inspection.
    async fn mark_stuck(&self, id: TimePeriodId, reason: &str) -> QueueResult<()>;

    /// Number of entries still waiting (pending or in flight).
    async fn pending_count(&self) -> QueueResult<u64>;

    /// Stuck entries, oldest first. Visible indefinitely until resolved
    /// or discarded.
    async fn stuck_entries(&self) -> QueueResult<Vec<QueueEntry>>;

    /// Manually drop an entry (resolution of a stuck submission).
    async fn discard(&self, id: TimePeriodId) -> QueueResult<bool>;
}
