use serde::{Deserialize, Serialize};
use time::Date;

use crate::budget::estimator::{ActivityTier, FormulaEstimate};
use crate::budget::synthesizer::BudgetBreakdown;
use crate::profile::dto::ProfilePayload;

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    #[serde(flatten)]
    pub profile: ProfilePayload,
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub as_of: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(flatten)]
    pub profile: ProfilePayload,
    pub measured_daily_avg: Option<f64>,
    pub activity_tier_override: Option<ActivityTier>,
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub as_of: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    pub formula: FormulaEstimate,
    pub measured_daily_avg: Option<f64>,
    #[serde(flatten)]
    pub budget: BudgetBreakdown,
}
