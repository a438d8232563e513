use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::baseline::dto::{BaselineExitRequest, StartBaselineRequest};
use crate::baseline::repo::BaselinePeriod;
use crate::baseline::services::{self, BaselineOutcome};
use crate::dates::today_utc;
use crate::db::AppState;
use crate::error::EngineError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/baseline", post(start_baseline))
        .route("/baseline", get(get_baseline))
        .route("/baseline/complete", post(complete_baseline))
        .route("/baseline/abandon", post(abandon_baseline))
}

#[instrument(skip(state, body))]
pub async fn start_baseline(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<StartBaselineRequest>,
) -> Result<Json<BaselinePeriod>, EngineError> {
    let start_date = body.start_date.unwrap_or_else(today_utc);
    let baseline = BaselinePeriod::start(&state.db, user_id, start_date).await?;
    Ok(Json(baseline))
}

#[instrument(skip(state))]
pub async fn get_baseline(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BaselinePeriod>, EngineError> {
    BaselinePeriod::find(&state.db, user_id)
        .await?
        .map(Json)
        .ok_or(EngineError::NotFound("baseline period"))
}

#[instrument(skip(state, body))]
pub async fn complete_baseline(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<BaselineExitRequest>,
) -> Result<Json<BaselineOutcome>, EngineError> {
    let as_of = body.as_of.unwrap_or_else(today_utc);
    let outcome = services::complete(&state.db, user_id, as_of).await?;
    Ok(Json(outcome))
}

#[instrument(skip(state, body))]
pub async fn abandon_baseline(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<BaselineExitRequest>,
) -> Result<Json<BaselineOutcome>, EngineError> {
    let as_of = body.as_of.unwrap_or_else(today_utc);
    let outcome = services::abandon(&state.db, user_id, as_of).await?;
    Ok(Json(outcome))
}
