use axum::{routing::post, Json, Router};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::budget::dto::{EstimateRequest, SynthesizeRequest, SynthesizeResponse};
use crate::budget::estimator::{formula_expenditure, FormulaEstimate};
use crate::budget::synthesizer::synthesize;
use crate::dates::today_utc;
use crate::db::AppState;
use crate::error::EngineError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budget/estimate", post(estimate))
        .route("/budget/synthesize", post(synthesize_budget))
}

/// Pure formula estimate at the declared activity level. No side effects.
#[instrument(skip_all)]
pub async fn estimate(
    AuthUser(_user_id): AuthUser,
    Json(body): Json<EstimateRequest>,
) -> Result<Json<FormulaEstimate>, EngineError> {
    let on = body.as_of.unwrap_or_else(today_utc);
    let p = &body.profile;
    let est = formula_expenditure(
        p.sex,
        p.weight_lb,
        p.height_in,
        p.birth_date,
        on,
        p.activity_level.multiplier(),
    )?;
    Ok(Json(est))
}

/// Full synthesis: formula estimate (optionally at a measured-tier override),
/// blended with a measured average when supplied, goal adjustment, safety
/// floor, macro split.
#[instrument(skip_all)]
pub async fn synthesize_budget(
    AuthUser(_user_id): AuthUser,
    Json(body): Json<SynthesizeRequest>,
) -> Result<Json<SynthesizeResponse>, EngineError> {
    let on = body.as_of.unwrap_or_else(today_utc);
    let p = &body.profile;
    let multiplier = body
        .activity_tier_override
        .map(|t| t.multiplier())
        .unwrap_or_else(|| p.activity_level.multiplier());
    let formula = formula_expenditure(p.sex, p.weight_lb, p.height_in, p.birth_date, on, multiplier)?;
    let budget = synthesize(
        formula.maintenance_kcal,
        body.measured_daily_avg,
        p.goal,
        p.weight_lb,
        p.target_weight_lb,
    )?;
    Ok(Json(SynthesizeResponse {
        formula,
        measured_daily_avg: body.measured_daily_avg,
        budget,
    }))
}
