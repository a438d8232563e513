use serde::{Deserialize, Serialize};
use time::Date;

use crate::metrics::services::MetricsReport;
use crate::observations::repo::{DailyObservation, DayType};

#[derive(Debug, Deserialize)]
pub struct LogConsumptionRequest {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub consumed_kcal: f64,
    pub day_type: Option<DayType>,
}

#[derive(Debug, Deserialize)]
pub struct LogBurnRequest {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub burned_kcal: f64,
}

/// The saved observation, plus the recomputed weekly metrics when an active
/// period covers the date (none during the baseline week).
#[derive(Debug, Serialize)]
pub struct ObservationResponse {
    pub observation: DailyObservation,
    pub metrics: Option<MetricsReport>,
}
