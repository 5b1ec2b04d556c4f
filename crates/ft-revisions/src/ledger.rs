//! Revision ledger service and store.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use ft_models::{Actor, TimePeriod, TimePeriodId};

use crate::diff::{creation_changes, diff_periods};
use crate::record::RevisionRecord;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("Revision storage error: {0}")]
    Storage(String),
}

pub type RevisionResult<T> = Result<T, RevisionError>;

/// Persistence seam for revision records. Append-only by contract:
/// implementations must never expose mutation or deletion.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    async fn append(&self, records: &[RevisionRecord]) -> RevisionResult<()>;

    /// All records for an aggregate, newest first.
    async fn list(&self, id: TimePeriodId) -> RevisionResult<Vec<RevisionRecord>>;
}

/// Appends revision records for submissions and edit batches.
pub struct RevisionLedger {
    store: Arc<dyn RevisionStore>,
}

impl RevisionLedger {
    pub fn new(store: Arc<dyn RevisionStore>) -> Self {
        Self { store }
    }

    /// Record the original submission: one record per populated field and
    /// child row, `old_value = None`, tagged `original_submission`.
    pub async fn record_original(
        &self,
        tp: &TimePeriod,
        actor: &Actor,
    ) -> RevisionResult<Vec<RevisionRecord>> {
        let records: Vec<RevisionRecord> = creation_changes(tp)
            .into_iter()
            .map(|c| {
                RevisionRecord::new(
                    tp.id,
                    tp.revision_number,
                    actor.id,
                    actor.stage(),
                    c.field,
                    None,
                    c.new,
                    None,
                )
                .original()
            })
            .collect();
        self.store.append(&records).await?;
        Ok(records)
    }

    /// Diff an edit batch and append one record per changed field.
    ///
    /// Returns the appended records; empty means nothing changed and the
    /// caller must not bump the aggregate's revision number. The records
    /// carry `old.revision_number + 1`, one increment for the whole
    /// batch, regardless of how many fields changed.
    pub async fn record_edit(
        &self,
        old: &TimePeriod,
        new: &TimePeriod,
        actor: &Actor,
        reason: Option<String>,
    ) -> RevisionResult<Vec<RevisionRecord>> {
        let changes = diff_periods(old, new);
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let revision = old.revision_number + 1;
        let records: Vec<RevisionRecord> = changes
            .into_iter()
            .map(|c| {
                RevisionRecord::new(
                    old.id,
                    revision,
                    actor.id,
                    actor.stage(),
                    c.field,
                    c.old,
                    c.new,
                    reason.clone(),
                )
            })
            .collect();
        self.store.append(&records).await?;
        Ok(records)
    }

    /// Audit trail for one aggregate, newest first. Finite and
    /// restartable; never used to reconstruct current state.
    pub async fn history(&self, id: TimePeriodId) -> RevisionResult<Vec<RevisionRecord>> {
        self.store.list(id).await
    }
}

/// In-memory store for tests and reference.
#[derive(Default)]
pub struct MemoryRevisionStore {
    records: parking_lot::RwLock<Vec<RevisionRecord>>,
}

impl MemoryRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevisionStore for MemoryRevisionStore {
    async fn append(&self, records: &[RevisionRecord]) -> RevisionResult<()> {
        self.records.write().extend_from_slice(records);
        Ok(())
    }

    async fn list(&self, id: TimePeriodId) -> RevisionResult<Vec<RevisionRecord>> {
        let records = self.records.read();
        let mut matching: Vec<RevisionRecord> = records
            .iter()
            .filter(|r| r.time_period_id == id)
            .cloned()
            .collect();
        // Newest first; within one batch keep append order stable.
        matching.reverse();
        Ok(matching)
    }
}
