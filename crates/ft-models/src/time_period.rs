//! The time period aggregate root.
//!
//! A time period plus all its owned child records is treated as one unit
//! for persistence and versioning. Identity is a client-generated UUID so
//! offline-created records are stable before first contact with the remote
//! store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use ft_core::types::GeoPoint;

use crate::children::{BreakItem, FleetUsageItem, PayRateAllocation};
use crate::status::WorkflowStatus;
use crate::work_ref::WorkRef;

/// Client-generated identity of a time period aggregate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePeriodId(pub Uuid);

impl TimePeriodId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TimePeriodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One captured work record and its child collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub id: TimePeriodId,
    /// Owning user.
    pub user_id: Uuid,
    pub work_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub finish_time: DateTime<Utc>,

    // Allowances, in minutes except the on-call flag.
    pub travel_to_site_min: u32,
    pub travel_from_site_min: u32,
    pub on_call: bool,
    pub misc_allowance_min: u32,

    /// Exactly one of {project, plant}, or neither.
    pub work_ref: Option<WorkRef>,

    // Material / ticket fields.
    pub concrete_mix_type: Option<String>,
    pub concrete_qty: Option<f64>,
    pub docket_number: Option<String>,

    pub comments: Option<String>,
    pub location: Option<GeoPoint>,

    /// Captured while the remote store was unreachable.
    pub offline_created: bool,
    /// Accepted by the remote store.
    pub synced: bool,

    pub status: WorkflowStatus,
    /// Monotonic; 0 at creation, +1 per accepted edit batch.
    pub revision_number: i32,

    pub submitted_at: DateTime<Utc>,
    pub submitted_by: Uuid,

    pub breaks: Vec<BreakItem>,
    pub fleet: Vec<FleetUsageItem>,
    pub pay_rates: Vec<PayRateAllocation>,
}

impl TimePeriod {
    /// Tracked scalar fields as a name -> JSON value map, used for
    /// revision diffing. Optional fields absent on the record map to
    /// `Null` so a later edit that sets them diffs as `None -> value`.
    ///
    /// `synced`, `status`, and `revision_number` are bookkeeping, not
    /// tracked fields: status changes are governed by the workflow and
    /// the revision number is derived from the ledger batches themselves.
    pub fn scalar_fields(&self) -> BTreeMap<&'static str, JsonValue> {
        let mut fields = BTreeMap::new();
        fields.insert("work_date", json!(self.work_date));
        fields.insert("start_time", json!(self.start_time));
        fields.insert("finish_time", json!(self.finish_time));
        fields.insert("travel_to_site_min", json!(self.travel_to_site_min));
        fields.insert("travel_from_site_min", json!(self.travel_from_site_min));
        fields.insert("on_call", json!(self.on_call));
        fields.insert("misc_allowance_min", json!(self.misc_allowance_min));
        fields.insert("work_ref", json!(self.work_ref));
        fields.insert("concrete_mix_type", json!(self.concrete_mix_type));
        fields.insert("concrete_qty", json!(self.concrete_qty));
        fields.insert("docket_number", json!(self.docket_number));
        fields.insert("comments", json!(self.comments));
        fields.insert("location", json!(self.location));
        fields
    }

    /// Whether this actor id owns the record.
    pub fn owned_by(&self, actor_id: Uuid) -> bool {
        self.user_id == actor_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

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
            offline_created: false,
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

    #[test]
    fn scalar_fields_track_optionals_as_null() {
        let tp = sample();
        let fields = tp.scalar_fields();
        assert_eq!(fields["comments"], JsonValue::Null);
        assert_eq!(fields["on_call"], json!(false));
        assert!(fields.contains_key("start_time"));
    }

    #[test]
    fn ownership() {
        let tp = sample();
        assert!(tp.owned_by(tp.user_id));
        assert!(!tp.owned_by(Uuid::new_v4()));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let tp = sample();
        let snapshot = serde_json::to_string(&tp).unwrap();
        let back: TimePeriod = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(back, tp);
    }
}
