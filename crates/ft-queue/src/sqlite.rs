//! SQLite-backed durable queue store.
//!
//! One `queued_time_periods` table keyed by the client-generated id, with
//! the serialized aggregate snapshot, the retry counter, and the status
//! tag. Kept independent of any UI presentation state.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

use ft_models::{TimePeriod, TimePeriodId};

use crate::entry::{QueueEntry, QueueEntryState, QueueError, QueueResult};
use crate::store::QueueStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS queued_time_periods (
    time_period_id TEXT PRIMARY KEY,
    snapshot       TEXT NOT NULL,
    state          TEXT NOT NULL DEFAULT 'pending',
    retry_count    INTEGER NOT NULL DEFAULT 0,
    last_error     TEXT,
    enqueued_at    TEXT NOT NULL
)
"#;

/// Durable queue persisted in a client-local SQLite database.
pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    /// Open (creating if missing) the queue database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> QueueResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        Self::with_options(options).await
    }

    /// Open an in-memory database (tests; contents die with the store).
    pub async fn open_in_memory() -> QueueResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Memory);
        Self::with_options(options).await
    }

    async fn with_options(options: SqliteConnectOptions) -> QueueResult<Self> {
        // A single connection serializes UI enqueues against drain-side
        // state changes, matching the in-memory store's lock.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> QueueResult<QueueEntry> {
        let snapshot: String = row.try_get("snapshot")?;
        let period: TimePeriod = serde_json::from_str(&snapshot)?;
        let state: String = row.try_get("state")?;
        let state = QueueEntryState::parse(&state)
            .ok_or_else(|| QueueError::Storage(format!("unknown queue state '{state}'")))?;
        let retry_count: i64 = row.try_get("retry_count")?;
        let enqueued_at: DateTime<Utc> = row.try_get("enqueued_at")?;
        Ok(QueueEntry {
            period,
            state,
            retry_count: retry_count as u32,
            last_error: row.try_get("last_error")?,
            enqueued_at,
        })
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn enqueue(&self, period: &TimePeriod) -> QueueResult<()> {
        let snapshot = serde_json::to_string(period)?;
        sqlx::query(
            r#"
            INSERT INTO queued_time_periods (time_period_id, snapshot, state, retry_count, enqueued_at)
            VALUES (?1, ?2, 'pending', 0, ?3)
            ON CONFLICT(time_period_id) DO UPDATE SET snapshot = excluded.snapshot
            "#,
        )
        .bind(period.id.to_string())
        .bind(snapshot)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        debug!(id = %period.id, "queued time period");
        Ok(())
    }

    async fn list_pending(&self) -> QueueResult<Vec<QueueEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM queued_time_periods WHERE state = 'pending' ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn get(&self, id: TimePeriodId) -> QueueResult<Option<QueueEntry>> {
        let row = sqlx::query("SELECT * FROM queued_time_periods WHERE time_period_id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn mark_in_flight(&self, id: TimePeriodId) -> QueueResult<bool> {
        let result = sqlx::query(
            "UPDATE queued_time_periods SET state = 'in_flight'
             WHERE time_period_id = ?1 AND state = 'pending'",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_in_flight(&self, id: TimePeriodId) -> QueueResult<()> {
        sqlx::query(
            "UPDATE queued_time_periods SET state = 'pending'
             WHERE time_period_id = ?1 AND state = 'in_flight'",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn release_all_in_flight(&self) -> QueueResult<u64> {
        let result =
            sqlx::query("UPDATE queued_time_periods SET state = 'pending' WHERE state = 'in_flight'")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn mark_synced(&self, id: TimePeriodId) -> QueueResult<()> {
        let result = sqlx::query("DELETE FROM queued_time_periods WHERE time_period_id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(id));
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: TimePeriodId,
        reason: &str,
        max_retries: u32,
    ) -> QueueResult<QueueEntryState> {
        let result = sqlx::query(
            r#"
            UPDATE queued_time_periods
            SET retry_count = retry_count + 1,
                last_error = ?2,
                state = CASE WHEN retry_count + 1 >= ?3 THEN 'stuck' ELSE 'pending' END
            WHERE time_period_id = ?1
            "#,
        )
        .bind(id.to_string())
        .bind(reason)
        .bind(max_retries as i64)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(id));
        }

        let row = sqlx::query("SELECT state FROM queued_time_periods WHERE time_period_id = ?1")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        let state: String = row.try_get("state")?;
        QueueEntryState::parse(&state)
            .ok_or_else(|| QueueError::Storage(format!("unknown queue state '{state}'")))
    }

    async fn mark_stuck(&self, id: TimePeriodId, reason: &str) -> QueueResult<()> {
        let result = sqlx::query(
            "UPDATE queued_time_periods SET state = 'stuck', last_error = ?2
             WHERE time_period_id = ?1",
        )
        .bind(id.to_string())
        .bind(reason)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(id));
        }
        Ok(())
    }

    async fn pending_count(&self) -> QueueResult<u64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS n FROM queued_time_periods WHERE state != 'stuck'")
                .fetch_one(&self.pool)
                .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    async fn stuck_entries(&self) -> QueueResult<Vec<QueueEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM queued_time_periods WHERE state = 'stuck' ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn discard(&self, id: TimePeriodId) -> QueueResult<bool> {
        let result = sqlx::query("DELETE FROM queued_time_periods WHERE time_period_id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
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
            travel_to_site_min: 15,
            travel_from_site_min: 15,
            on_call: false,
            misc_allowance_min: 0,
            work_ref: None,
            concrete_mix_type: None,
            concrete_qty: None,
            docket_number: None,
            comments: Some("captured offline".into()),
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
    async fn snapshot_round_trips() {
        let store = SqliteQueueStore::open_in_memory().await.unwrap();
        let tp = sample();
        store.enqueue(&tp).await.unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].period, tp);
        assert_eq!(pending[0].state, QueueEntryState::Pending);
    }

    #[tokio::test]
    async fn claim_then_fail_then_stuck() {
        let store = SqliteQueueStore::open_in_memory().await.unwrap();
        let tp = sample();
        store.enqueue(&tp).await.unwrap();

        assert!(store.mark_in_flight(tp.id).await.unwrap());
        assert!(!store.mark_in_flight(tp.id).await.unwrap());
        assert_eq!(
            store.get(tp.id).await.unwrap().unwrap().state,
            QueueEntryState::InFlight
        );

        assert_eq!(
            store.mark_failed(tp.id, "gateway timeout", 2).await.unwrap(),
            QueueEntryState::Pending
        );
        assert_eq!(
            store.mark_failed(tp.id, "gateway timeout", 2).await.unwrap(),
            QueueEntryState::Stuck
        );
        assert_eq!(store.stuck_entries().await.unwrap().len(), 1);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_synced_removes_the_entry() {
        let store = SqliteQueueStore::open_in_memory().await.unwrap();
        let tp = sample();
        store.enqueue(&tp).await.unwrap();
        store.mark_in_flight(tp.id).await.unwrap();
        store.mark_synced(tp.id).await.unwrap();

        assert!(store.list_pending().await.unwrap().is_empty());
        assert!(matches!(
            store.mark_synced(tp.id).await,
            Err(QueueError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn queue_survives_reopen() {
        let path = std::env::temp_dir().join(format!("ft-queue-test-{}.db", Uuid::new_v4()));
        let tp = sample();
        {
            let store = SqliteQueueStore::open(&path).await.unwrap();
            store.enqueue(&tp).await.unwrap();
        }

        let store = SqliteQueueStore::open(&path).await.unwrap();
        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id(), tp.id);

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
