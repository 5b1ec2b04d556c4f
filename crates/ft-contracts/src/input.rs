//! Flat submission input as captured by the UI layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use ft_core::types::GeoPoint;
use ft_models::{PayCategory, RefSource};

/// Raw time period input. Project and plant are both present here because
/// the capture form offers both; the contract rejects inputs that set the
/// two together.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TimePeriodInput {
    pub work_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub finish_time: DateTime<Utc>,

    #[serde(default)]
    pub travel_to_site_min: u32,
    #[serde(default)]
    pub travel_from_site_min: u32,
    #[serde(default)]
    pub on_call: bool,
    #[serde(default)]
    pub misc_allowance_min: u32,

    #[serde(default)]
    pub project: Option<RefSource>,
    #[serde(default)]
    pub plant: Option<RefSource>,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub concrete_mix_type: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub concrete_qty: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub docket_number: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,

    #[serde(default)]
    pub breaks: Vec<BreakInput>,
    #[serde(default)]
    pub used_fleet: Vec<uuid::Uuid>,
    #[serde(default)]
    pub mobilised_fleet: Vec<uuid::Uuid>,
    #[serde(default)]
    pub pay_rates: Vec<PayRateInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BreakInput {
    pub start: DateTime<Utc>,
    pub finish: DateTime<Utc>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PayRateInput {
    pub category: PayCategory,
    pub hours: u32,
    pub minutes: u32,
}
