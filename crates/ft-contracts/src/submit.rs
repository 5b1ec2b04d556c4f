//! Submission contract: validate a flat input and build the aggregate.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use ft_core::config::Limits;
use ft_core::error::ValidationErrors;
use ft_core::types::{is_quarter_hour, on_quarter_hour};
use ft_models::{
    BreakItem, FleetKind, FleetUsageItem, PayRateAllocation, TimePeriod, TimePeriodId,
    WorkRef, WorkflowStatus,
};

use crate::input::TimePeriodInput;

/// Validates a [`TimePeriodInput`] and normalizes it into a
/// [`TimePeriod`] aggregate.
///
/// Limits are read from configuration at construction time, never
/// hard-coded. All violations accumulate into one [`ValidationErrors`]
/// so the submitting actor sees the full picture at once.
pub struct SubmitTimePeriodContract {
    limits: Limits,
}

impl SubmitTimePeriodContract {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Validate and build. On success the aggregate starts at
    /// `Submitted`, revision 0, unsynced, with children sorted and
    /// renumbered by display order.
    pub fn build(
        &self,
        user_id: Uuid,
        input: TimePeriodInput,
    ) -> Result<TimePeriod, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.check_declarative(&input, &mut errors);
        self.check_times(&input, &mut errors);
        self.check_work_ref(&input, &mut errors);
        self.check_breaks(&input, &mut errors);
        self.check_fleet(&input, &mut errors);
        self.check_pay_rates(&input, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(self.normalize(user_id, input))
    }

    /// Derive-level rules (lengths, ranges) from the `validator` crate.
    fn check_declarative(&self, input: &TimePeriodInput, errors: &mut ValidationErrors) {
        if let Err(derive_errors) = input.validate() {
            for (field, field_errors) in derive_errors.field_errors() {
                for e in field_errors {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("is invalid ({})", e.code));
                    errors.add(field.to_string(), message);
                }
            }
        }
    }

    fn check_times(&self, input: &TimePeriodInput, errors: &mut ValidationErrors) {
        if input.finish_time <= input.start_time {
            errors.add("finish_time", "must be after start_time");
        }
        if !on_quarter_hour(input.start_time) {
            errors.add("start_time", "must align to a 15 minute boundary");
        }
        if !on_quarter_hour(input.finish_time) {
            errors.add("finish_time", "must align to a 15 minute boundary");
        }
        for (name, minutes) in [
            ("travel_to_site_min", input.travel_to_site_min),
            ("travel_from_site_min", input.travel_from_site_min),
            ("misc_allowance_min", input.misc_allowance_min),
        ] {
            if !is_quarter_hour(minutes) {
                errors.add(name, "must be a multiple of 15 minutes");
            }
        }
    }

    fn check_work_ref(&self, input: &TimePeriodInput, errors: &mut ValidationErrors) {
        if input.project.is_some() && input.plant.is_some() {
            errors.add("project", "cannot be set together with plant");
            errors.add("plant", "cannot be set together with project");
        }
    }

    fn check_breaks(&self, input: &TimePeriodInput, errors: &mut ValidationErrors) {
        if input.breaks.len() > self.limits.max_breaks {
            errors.add(
                "breaks",
                format!("at most {} breaks are allowed", self.limits.max_breaks),
            );
        }
        for (i, b) in input.breaks.iter().enumerate() {
            if b.finish <= b.start {
                errors.add(format!("breaks[{i}].finish"), "must be after start");
            }
            if !on_quarter_hour(b.start) {
                errors.add(
                    format!("breaks[{i}].start"),
                    "must align to a 15 minute boundary",
                );
            }
            if !on_quarter_hour(b.finish) {
                errors.add(
                    format!("breaks[{i}].finish"),
                    "must align to a 15 minute boundary",
                );
            }
        }
        for i in 0..input.breaks.len() {
            for j in (i + 1)..input.breaks.len() {
                let (a, b) = (&input.breaks[i], &input.breaks[j]);
                if a.start < b.finish && b.start < a.finish {
                    errors.add(format!("breaks[{j}]"), format!("overlaps breaks[{i}]"));
                }
            }
        }
    }

    fn check_fleet(&self, input: &TimePeriodInput, errors: &mut ValidationErrors) {
        if input.used_fleet.len() > self.limits.max_used_fleet {
            errors.add(
                "used_fleet",
                format!(
                    "at most {} used fleet items are allowed",
                    self.limits.max_used_fleet
                ),
            );
        }
        if input.mobilised_fleet.len() > self.limits.max_mobilised_fleet {
            errors.add(
                "mobilised_fleet",
                format!(
                    "at most {} mobilised fleet items are allowed",
                    self.limits.max_mobilised_fleet
                ),
            );
        }
        for (name, list) in [
            ("used_fleet", &input.used_fleet),
            ("mobilised_fleet", &input.mobilised_fleet),
        ] {
            let mut seen = std::collections::HashSet::new();
            for plant_id in list {
                if !seen.insert(plant_id) {
                    errors.add(name, format!("plant {plant_id} is listed twice"));
                }
            }
        }
    }

    fn check_pay_rates(&self, input: &TimePeriodInput, errors: &mut ValidationErrors) {
        let mut seen = std::collections::HashSet::new();
        for rate in &input.pay_rates {
            if !seen.insert(rate.category) {
                errors.add(
                    "pay_rate.category",
                    format!("duplicate allocation for {}", rate.category.as_str()),
                );
            }
            if rate.minutes >= 60 {
                errors.add("pay_rate.minutes", "must be below 60");
            }
            if !is_quarter_hour(rate.hours * 60 + rate.minutes) {
                errors.add(
                    "pay_rate.hours",
                    format!(
                        "{} total of {}h{}m is not a multiple of 15 minutes",
                        rate.category.as_str(),
                        rate.hours,
                        rate.minutes
                    ),
                );
            }
        }
    }

    fn normalize(&self, user_id: Uuid, input: TimePeriodInput) -> TimePeriod {
        let work_ref = match (input.project, input.plant) {
            (Some(p), None) => Some(WorkRef::Project(p)),
            (None, Some(p)) => Some(WorkRef::Plant(p)),
            _ => None,
        };

        let mut breaks: Vec<BreakItem> = input
            .breaks
            .into_iter()
            .map(|b| BreakItem {
                start: b.start,
                finish: b.finish,
                reason: b.reason,
                display_order: 0,
            })
            .collect();
        breaks.sort_by_key(|b| b.start);
        for (i, b) in breaks.iter_mut().enumerate() {
            b.display_order = i as i32;
        }

        let mut fleet = Vec::with_capacity(input.used_fleet.len() + input.mobilised_fleet.len());
        for (i, plant_id) in input.used_fleet.into_iter().enumerate() {
            fleet.push(FleetUsageItem::new(plant_id, FleetKind::Used, i as i32));
        }
        for (i, plant_id) in input.mobilised_fleet.into_iter().enumerate() {
            fleet.push(FleetUsageItem::new(plant_id, FleetKind::Mobilised, i as i32));
        }

        let pay_rates = input
            .pay_rates
            .into_iter()
            .map(|r| PayRateAllocation::new(r.category, r.hours, r.minutes))
            .collect();

        TimePeriod {
            id: TimePeriodId::generate(),
            user_id,
            work_date: input.work_date,
            start_time: input.start_time,
            finish_time: input.finish_time,
            travel_to_site_min: input.travel_to_site_min,
            travel_from_site_min: input.travel_from_site_min,
            on_call: input.on_call,
            misc_allowance_min: input.misc_allowance_min,
            work_ref,
            concrete_mix_type: input.concrete_mix_type,
            concrete_qty: input.concrete_qty,
            docket_number: input.docket_number,
            comments: input.comments,
            location: input.location,
            offline_created: false,
            synced: false,
            status: WorkflowStatus::Submitted,
            revision_number: 0,
            submitted_at: Utc::now(),
            submitted_by: user_id,
            breaks,
            fleet,
            pay_rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use ft_models::{PayCategory, RefSource};

    use crate::input::{BreakInput, PayRateInput};

    fn ts(h: u32, m: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn base_input() -> TimePeriodInput {
        TimePeriodInput {
            work_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            start_time: ts(8, 0),
            finish_time: ts(16, 30),
            travel_to_site_min: 0,
            travel_from_site_min: 0,
            on_call: false,
            misc_allowance_min: 0,
            project: None,
            plant: None,
            concrete_mix_type: None,
            concrete_qty: None,
            docket_number: None,
            comments: None,
            location: None,
            breaks: vec![],
            used_fleet: vec![],
            mobilised_fleet: vec![],
            pay_rates: vec![],
        }
    }

    fn contract() -> SubmitTimePeriodContract {
        SubmitTimePeriodContract::new(Limits::default())
    }

    #[test]
    fn builds_a_fresh_aggregate_at_revision_zero() {
        let mut input = base_input();
        input.breaks = vec![BreakInput {
            start: ts(12, 0),
            finish: ts(12, 30),
            reason: Some("lunch".into()),
        }];

        let tp = contract().build(Uuid::new_v4(), input).unwrap();
        assert_eq!(tp.status, WorkflowStatus::Submitted);
        assert_eq!(tp.revision_number, 0);
        assert!(!tp.synced);
        assert_eq!(tp.breaks.len(), 1);
        assert_eq!(tp.breaks[0].display_order, 0);
    }

    #[test]
    fn rejects_finish_before_start() {
        let mut input = base_input();
        input.finish_time = ts(7, 0);
        let errors = contract().build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("finish_time"));
    }

    #[test]
    fn rejects_unquantized_start_time_without_rounding() {
        let mut input = base_input();
        input.start_time = ts(8, 10);
        let errors = contract().build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("start_time"));
    }

    #[test]
    fn rejects_project_and_plant_together() {
        let mut input = base_input();
        input.project = Some(RefSource::Id(Uuid::new_v4()));
        input.plant = Some(RefSource::Code("100".into()));
        let errors = contract().build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("project"));
        assert!(errors.has_error("plant"));
    }

    #[test]
    fn rejects_overlapping_breaks() {
        let mut input = base_input();
        input.breaks = vec![
            BreakInput {
                start: ts(12, 0),
                finish: ts(12, 30),
                reason: None,
            },
            BreakInput {
                start: ts(12, 15),
                finish: ts(12, 45),
                reason: None,
            },
        ];
        let errors = contract().build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("breaks[1]"));
    }

    #[test]
    fn enforces_configured_break_limit() {
        let limits = Limits {
            max_breaks: 1,
            ..Limits::default()
        };
        let contract = SubmitTimePeriodContract::new(limits);
        let mut input = base_input();
        input.breaks = vec![
            BreakInput {
                start: ts(10, 0),
                finish: ts(10, 15),
                reason: None,
            },
            BreakInput {
                start: ts(12, 0),
                finish: ts(12, 30),
                reason: None,
            },
        ];
        let errors = contract.build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("breaks"));
    }

    #[test]
    fn rejects_duplicate_fleet_reference() {
        let mut input = base_input();
        let digger = Uuid::new_v4();
        input.used_fleet = vec![digger, digger];
        let errors = contract().build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("used_fleet"));
    }

    #[test]
    fn same_plant_may_be_used_and_mobilised() {
        let mut input = base_input();
        let digger = Uuid::new_v4();
        input.used_fleet = vec![digger];
        input.mobilised_fleet = vec![digger];
        assert!(contract().build(Uuid::new_v4(), input).is_ok());
    }

    #[test]
    fn seventy_minute_pay_rate_names_the_field() {
        let mut input = base_input();
        input.pay_rates = vec![PayRateInput {
            category: PayCategory::FlatTime,
            hours: 1,
            minutes: 10,
        }];
        let errors = contract().build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("pay_rate.hours"));
    }

    #[test]
    fn rejects_duplicate_pay_category() {
        let mut input = base_input();
        input.pay_rates = vec![
            PayRateInput {
                category: PayCategory::DoubleTime,
                hours: 2,
                minutes: 0,
            },
            PayRateInput {
                category: PayCategory::DoubleTime,
                hours: 1,
                minutes: 0,
            },
        ];
        let errors = contract().build(Uuid::new_v4(), input).unwrap_err();
        assert!(errors.has_error("pay_rate.category"));
    }

    #[test]
    fn breaks_are_sorted_and_renumbered() {
        let mut input = base_input();
        input.breaks = vec![
            BreakInput {
                start: ts(12, 0),
                finish: ts(12, 30),
                reason: None,
            },
            BreakInput {
                start: ts(10, 0),
                finish: ts(10, 15),
                reason: None,
            },
        ];
        let tp = contract().build(Uuid::new_v4(), input).unwrap();
        assert_eq!(tp.breaks[0].start, ts(10, 0));
        assert_eq!(tp.breaks[0].display_order, 0);
        assert_eq!(tp.breaks[1].display_order, 1);
    }
}
