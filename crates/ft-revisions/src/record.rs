//! Revision record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use ft_models::{TimePeriodId, WorkflowStage};

/// One immutable field-level change record.
///
/// Child-collection changes are keyed by a synthetic field name
/// identifying the child type and its display order or category tag
/// (`break[0]`, `fleet.used[<plant id>]`, `pay_rate.double_time`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub id: Uuid,
    pub time_period_id: TimePeriodId,
    /// The aggregate's revision number at the time of this change.
    pub revision_number: i32,
    pub recorded_at: DateTime<Utc>,
    pub actor_id: Uuid,
    /// Approval role context in effect when the change was recorded.
    pub stage: WorkflowStage,
    pub field: String,
    pub old_value: Option<JsonValue>,
    pub new_value: Option<JsonValue>,
    pub reason: Option<String>,
    /// Marks records documenting the very first submission.
    pub original_submission: bool,
}

impl RevisionRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time_period_id: TimePeriodId,
        revision_number: i32,
        actor_id: Uuid,
        stage: WorkflowStage,
        field: impl Into<String>,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_period_id,
            revision_number,
            recorded_at: Utc::now(),
            actor_id,
            stage,
            field: field.into(),
            old_value,
            new_value,
            reason,
            original_submission: false,
        }
    }

    pub fn original(mut self) -> Self {
        self.original_submission = true;
        self
    }
}
