//! Field-level diffing of time period aggregates.
//!
//! Scalar fields diff one by one; child collections diff as wholesale
//! replacements, producing one change per removed, added, or modified
//! child row.

use std::collections::BTreeMap;

use serde_json::{json, Value as JsonValue};

use ft_models::{FleetKind, TimePeriod};

/// One changed field: `old` is `None` on addition (and on every field of
/// an original submission), `new` is `None` on removal.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<JsonValue>,
    pub new: Option<JsonValue>,
}

impl FieldChange {
    fn set(field: impl Into<String>, new: JsonValue) -> Self {
        Self {
            field: field.into(),
            old: None,
            new: Some(new),
        }
    }

    fn changed(field: impl Into<String>, old: JsonValue, new: JsonValue) -> Self {
        Self {
            field: field.into(),
            old: Some(old),
            new: Some(new),
        }
    }

    fn removed(field: impl Into<String>, old: JsonValue) -> Self {
        Self {
            field: field.into(),
            old: Some(old),
            new: None,
        }
    }
}

/// Changes documenting an original submission: one per populated field
/// and one per child row, all with `old = None`.
pub fn creation_changes(tp: &TimePeriod) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    for (field, value) in tp.scalar_fields() {
        if !value.is_null() {
            changes.push(FieldChange::set(field, value));
        }
    }
    for (key, value) in child_fields(tp) {
        changes.push(FieldChange::set(key, value));
    }
    changes
}

/// Diff two snapshots of the same aggregate. Empty when nothing changed.
pub fn diff_periods(old: &TimePeriod, new: &TimePeriod) -> Vec<FieldChange> {
    debug_assert_eq!(old.id, new.id);

    let mut changes = Vec::new();

    let old_fields = old.scalar_fields();
    for (field, new_value) in new.scalar_fields() {
        // scalar_fields always yields the full tracked set, so a missing
        // old key cannot happen; Null-vs-Null is a no-op.
        let old_value = old_fields.get(field).cloned().unwrap_or(JsonValue::Null);
        if old_value != new_value {
            match (old_value.is_null(), new_value.is_null()) {
                (true, false) => changes.push(FieldChange::set(field, new_value)),
                (false, true) => changes.push(FieldChange::removed(field, old_value)),
                _ => changes.push(FieldChange::changed(field, old_value, new_value)),
            }
        }
    }

    let old_children = child_fields(old);
    let new_children = child_fields(new);
    for (key, new_value) in &new_children {
        match old_children.get(key) {
            None => changes.push(FieldChange::set(key.clone(), new_value.clone())),
            Some(old_value) if old_value != new_value => changes.push(FieldChange::changed(
                key.clone(),
                old_value.clone(),
                new_value.clone(),
            )),
            Some(_) => {}
        }
    }
    for (key, old_value) in &old_children {
        if !new_children.contains_key(key) {
            changes.push(FieldChange::removed(key.clone(), old_value.clone()));
        }
    }

    changes
}

/// Child rows keyed by synthetic field name.
fn child_fields(tp: &TimePeriod) -> BTreeMap<String, JsonValue> {
    let mut fields = BTreeMap::new();

    for b in &tp.breaks {
        fields.insert(
            format!("break[{}]", b.display_order),
            json!({ "start": b.start, "finish": b.finish, "reason": b.reason }),
        );
    }

    for f in &tp.fleet {
        let role = match f.kind {
            FleetKind::Used => "used",
            FleetKind::Mobilised => "mobilised",
        };
        fields.insert(
            format!("fleet.{}[{}]", role, f.plant_id),
            json!({ "display_order": f.display_order }),
        );
    }

    for r in &tp.pay_rates {
        fields.insert(
            format!("pay_rate.{}", r.category.as_str()),
            json!({ "hours": r.hours, "minutes": r.minutes }),
        );
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use ft_models::{
        BreakItem, PayCategory, PayRateAllocation, TimePeriodId, WorkflowStatus,
    };

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
    fn creation_skips_unpopulated_optionals() {
        let tp = sample();
        let changes = creation_changes(&tp);
        assert!(changes.iter().all(|c| c.old.is_none()));
        assert!(changes.iter().any(|c| c.field == "start_time"));
        assert!(!changes.iter().any(|c| c.field == "comments"));
    }

    #[test]
    fn identical_snapshots_diff_empty() {
        let tp = sample();
        assert!(diff_periods(&tp, &tp.clone()).is_empty());
    }

    #[test]
    fn scalar_change_produces_one_record() {
        let old = sample();
        let mut new = old.clone();
        new.finish_time = Utc.with_ymd_and_hms(2025, 6, 1, 17, 0, 0).unwrap();
        let changes = diff_periods(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "finish_time");
        assert!(changes[0].old.is_some());
    }

    #[test]
    fn setting_an_optional_diffs_as_addition() {
        let old = sample();
        let mut new = old.clone();
        new.comments = Some("edited by supervisor".into());
        let changes = diff_periods(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "comments");
        assert!(changes[0].old.is_none());
    }

    #[test]
    fn removed_break_produces_removal_record() {
        let mut old = sample();
        old.breaks = vec![BreakItem::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap(),
            0,
        )];
        let mut new = old.clone();
        new.breaks.clear();

        let changes = diff_periods(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "break[0]");
        assert!(changes[0].new.is_none());
    }

    #[test]
    fn pay_rate_keyed_by_category() {
        let old = sample();
        let mut new = old.clone();
        new.pay_rates = vec![PayRateAllocation::new(PayCategory::HolidayHours, 8, 0)];
        let changes = diff_periods(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "pay_rate.holiday_hours");
    }
}
