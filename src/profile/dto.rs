use serde::Deserialize;
use time::Date;

use crate::budget::estimator::{DeclaredActivity, Goal, SexCategory};

/// Physical profile as sent by the client during onboarding flows.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilePayload {
    pub sex: SexCategory,
    pub weight_lb: f64,
    pub height_in: f64,
    #[serde(with = "crate::dates::iso_date")]
    pub birth_date: Date,
    pub activity_level: DeclaredActivity,
    pub goal: Goal,
    pub target_weight_lb: f64,
}
