//! Child entities owned by a time period.
//!
//! Children are unbounded in count, owned exclusively by one aggregate, and
//! replaced wholesale on edit. The legacy numbered-column storage (fleet
//! slot 1..6, break 1..3) is re-architected as collections keyed by
//! display order, with UI-facing maxima coming from configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A break taken inside the work period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakItem {
    pub start: DateTime<Utc>,
    pub finish: DateTime<Utc>,
    pub reason: Option<String>,
    pub display_order: i32,
}

impl BreakItem {
    pub fn new(start: DateTime<Utc>, finish: DateTime<Utc>, display_order: i32) -> Self {
        Self {
            start,
            finish,
            reason: None,
            display_order,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Half-open interval overlap; touching endpoints do not overlap.
    pub fn overlaps(&self, other: &BreakItem) -> bool {
        self.start < other.finish && other.start < self.finish
    }
}

/// Role a fleet item played during the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetKind {
    /// Operated during the work.
    Used,
    /// Mobilised to site for standby.
    Mobilised,
}

impl FleetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Used => "used",
            Self::Mobilised => "mobilised",
        }
    }
}

/// A plant/equipment item listed on the period.
///
/// `(plant_id, kind)` is unique within one aggregate: the same equipment
/// cannot be listed twice in the same role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetUsageItem {
    pub plant_id: Uuid,
    pub kind: FleetKind,
    pub display_order: i32,
}

impl FleetUsageItem {
    pub fn new(plant_id: Uuid, kind: FleetKind, display_order: i32) -> Self {
        Self {
            plant_id,
            kind,
            display_order,
        }
    }
}

/// Pay rate category. Seven fixed tags; at most one allocation per tag per
/// aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayCategory {
    FlatTime,
    TimeAndAHalf,
    DoubleTime,
    FlatTimeNotWorked,
    TimeAndAHalfNotWorked,
    DoubleTimeNotWorked,
    HolidayHours,
}

impl PayCategory {
    pub const ALL: [PayCategory; 7] = [
        Self::FlatTime,
        Self::TimeAndAHalf,
        Self::DoubleTime,
        Self::FlatTimeNotWorked,
        Self::TimeAndAHalfNotWorked,
        Self::DoubleTimeNotWorked,
        Self::HolidayHours,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatTime => "flat_time",
            Self::TimeAndAHalf => "time_and_a_half",
            Self::DoubleTime => "double_time",
            Self::FlatTimeNotWorked => "flat_time_not_worked",
            Self::TimeAndAHalfNotWorked => "time_and_a_half_not_worked",
            Self::DoubleTimeNotWorked => "double_time_not_worked",
            Self::HolidayHours => "holiday_hours",
        }
    }
}

/// Hours allocated to one pay category.
///
/// The total must be expressible in quarter hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRateAllocation {
    pub category: PayCategory,
    pub hours: u32,
    pub minutes: u32,
}

impl PayRateAllocation {
    pub fn new(category: PayCategory, hours: u32, minutes: u32) -> Self {
        Self {
            category,
            hours,
            minutes,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn break_overlap() {
        let lunch = BreakItem::new(ts(12, 0), ts(12, 30), 0);
        let smoko = BreakItem::new(ts(10, 0), ts(10, 15), 1);
        let clash = BreakItem::new(ts(12, 15), ts(12, 45), 1);
        assert!(!lunch.overlaps(&smoko));
        assert!(lunch.overlaps(&clash));
    }

    #[test]
    fn adjacent_breaks_do_not_overlap() {
        let a = BreakItem::new(ts(12, 0), ts(12, 30), 0);
        let b = BreakItem::new(ts(12, 30), ts(12, 45), 1);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn pay_allocation_total() {
        let alloc = PayRateAllocation::new(PayCategory::DoubleTime, 1, 30);
        assert_eq!(alloc.total_minutes(), 90);
    }
}
