//! In-memory queue store for tests and reference behavior.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use ft_models::{TimePeriod, TimePeriodId};

use crate::entry::{QueueEntry, QueueEntryState, QueueError, QueueResult};
use crate::store::QueueStore;

#[derive(Default)]
struct Inner {
    /// Enqueue order.
    order: Vec<TimePeriodId>,
    entries: HashMap<TimePeriodId, QueueEntry>,
}

/// Mutex-synchronized in-memory store. The UI thread enqueues while the
/// background sync task drains; both go through the same lock.
#[derive(Default)]
pub struct MemoryQueueStore {
    inner: Mutex<Inner>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn enqueue(&self, period: &TimePeriod) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        let id = period.id;
        if let Some(existing) = inner.entries.get_mut(&id) {
            existing.period = period.clone();
            return Ok(());
        }
        inner.order.push(id);
        inner.entries.insert(
            id,
            QueueEntry {
                period: period.clone(),
                state: QueueEntryState::Pending,
                retry_count: 0,
                last_error: None,
                enqueued_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list_pending(&self) -> QueueResult<Vec<QueueEntry>> {
        let inner = self.inner.lock();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .filter(|e| e.state == QueueEntryState::Pending)
            .cloned()
            .collect())
    }

    async fn get(&self, id: TimePeriodId) -> QueueResult<Option<QueueEntry>> {
        Ok(self.inner.lock().entries.get(&id).cloned())
    }

    async fn mark_in_flight(&self, id: TimePeriodId) -> QueueResult<bool> {
        let mut inner = self.inner.lock();
        match inner.entries.get_mut(&id) {
            Some(e) if e.state == QueueEntryState::Pending => {
                e.state = QueueEntryState::InFlight;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_in_flight(&self, id: TimePeriodId) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        if let Some(e) = inner.entries.get_mut(&id) {
            if e.state == QueueEntryState::InFlight {
                e.state = QueueEntryState::Pending;
            }
        }
        Ok(())
    }

    async fn release_all_in_flight(&self) -> QueueResult<u64> {
        let mut inner = self.inner.lock();
        let mut released = 0;
        for e in inner.entries.values_mut() {
            if e.state == QueueEntryState::InFlight {
                e.state = QueueEntryState::Pending;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn mark_synced(&self, id: TimePeriodId) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        if inner.entries.remove(&id).is_none() {
            return Err(QueueError::NotFound(id));
        }
        inner.order.retain(|other| *other != id);
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: TimePeriodId,
        reason: &str,
        max_retries: u32,
    ) -> QueueResult<QueueEntryState> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(&id)
            .ok_or(QueueError::NotFound(id))?;
        entry.retry_count += 1;
        entry.last_error = Some(reason.to_string());
        entry.state = if entry.retry_count >= max_retries {
            QueueEntryState::Stuck
        } else {
            QueueEntryState::Pending
        };
        Ok(entry.state)
    }

    async fn mark_stuck(&self, id: TimePeriodId, reason: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(&id)
            .ok_or(QueueError::NotFound(id))?;
        entry.state = QueueEntryState::Stuck;
        entry.last_error = Some(reason.to_string());
        Ok(())
    }

    async fn pending_count(&self) -> QueueResult<u64> {
        let inner = self.inner.lock();
        Ok(inner
            .entries
            .values()
            .filter(|e| e.state != QueueEntryState::Stuck)
            .count() as u64)
    }

    async fn stuck_entries(&self) -> QueueResult<Vec<QueueEntry>> {
        let inner = self.inner.lock();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .filter(|e| e.state == QueueEntryState::Stuck)
            .cloned()
            .collect())
    }

    async fn discard(&self, id: TimePeriodId) -> QueueResult<bool> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(&id).is_some();
        inner.order.retain(|other| *other != id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    use ft_models::WorkflowStatus;

    fn sample() -> TimePeriod {
        let user = Uuid::new_v4();
        TimePeriod {
            id: TimePeriodId::generate(),
            user_id: user,
            work_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            start_time: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            finish_time: Utc.with_ymd_and_hms(2025, 6, 1, 16, 30, 0).unwrap(),
            travel_to_site_min: 0,
            travel_from_site_min: 0,
            on_call: false,
            misc_allowance_min: 0,
            work_ref: None,
            concrete_mix_type: None,
            concrete_qty: None,
            docket_number: None,
            comments: None,
            location: None,
            offline_created: true,
            synced: false,
            status: WorkflowStatus::Submitted,
            revision_number: 0,
            submitted_at: Utc::now(),
            submitted_by: user,
            breaks: vec![],
            fleet: vec![],
            pay_rates: vec![],
        }
    }

    #[tokio::test]
    async fn enqueue_preserves_order() {
        let store = MemoryQueueStore::new();
        let first = sample();
        let second = sample();
        store.enqueue(&first).await.unwrap();
        store.enqueue(&second).await.unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id(), first.id);
        assert_eq!(pending[1].id(), second.id);
    }

    #[tokio::test]
    async fn re_enqueue_keeps_position_and_retries() {
        let store = MemoryQueueStore::new();
        let mut tp = sample();
        store.enqueue(&tp).await.unwrap();
        store.mark_failed(tp.id, "offline", 5).await.unwrap();

        tp.comments = Some("amended before sync".into());
        store.enqueue(&tp).await.unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].retry_count, 1);
        assert_eq!(
            pending[0].period.comments.as_deref(),
            Some("amended before sync")
        );
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let store = MemoryQueueStore::new();
        let tp = sample();
        store.enqueue(&tp).await.unwrap();

        assert!(store.mark_in_flight(tp.id).await.unwrap());
        assert!(!store.mark_in_flight(tp.id).await.unwrap());

        store.release_in_flight(tp.id).await.unwrap();
        assert!(store.mark_in_flight(tp.id).await.unwrap());
    }

    #[tokio::test]
    async fn mark_failed_flips_to_stuck_at_cap() {
        let store = MemoryQueueStore::new();
        let tp = sample();
        store.enqueue(&tp).await.unwrap();

        assert_eq!(
            store.mark_failed(tp.id, "timeout", 2).await.unwrap(),
            QueueEntryState::Pending
        );
        assert_eq!(
            store.mark_failed(tp.id, "timeout", 2).await.unwrap(),
            QueueEntryState::Stuck
        );

        let stuck = store.stuck_entries().await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].last_error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn get_reports_any_state() {
        let store = MemoryQueueStore::new();
        let tp = sample();
        assert!(store.get(tp.id).await.unwrap().is_none());

        store.enqueue(&tp).await.unwrap();
        store.mark_stuck(tp.id, "code not found").await.unwrap();

        let entry = store.get(tp.id).await.unwrap().unwrap();
        assert_eq!(entry.state, QueueEntryState::Stuck);
        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn synced_entries_are_removed() {
        let store = MemoryQueueStore::new();
        let tp = sample();
        store.enqueue(&tp).await.unwrap();
        store.mark_in_flight(tp.id).await.unwrap();
        store.mark_synced(tp.id).await.unwrap();

        assert_eq!(store.pending_count().await.unwrap(), 0);
        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stuck_entries_stay_until_discarded() {
        let store = MemoryQueueStore::new();
        let tp = sample();
        store.enqueue(&tp).await.unwrap();
        store.mark_stuck(tp.id, "project code not found").await.unwrap();

        assert_eq!(store.stuck_entries().await.unwrap().len(), 1);
        assert!(store.discard(tp.id).await.unwrap());
        assert!(store.stuck_entries().await.unwrap().is_empty());
    }
}
