use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::dates::today_utc;
use crate::db::AppState;
use crate::error::EngineError;
use crate::periods::dto::RotateRequest;
use crate::periods::repo::WeeklyPeriod;
use crate::periods::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/periods/rotate", post(rotate))
        .route("/periods/current", get(current))
}

#[instrument(skip(state, body))]
pub async fn rotate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<RotateRequest>,
) -> Result<Json<WeeklyPeriod>, EngineError> {
    let as_of = body.as_of.unwrap_or_else(today_utc);
    let period = services::create_or_rotate(&state.db, user_id, as_of).await?;
    Ok(Json(period))
}

#[instrument(skip(state))]
pub async fn current(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<WeeklyPeriod>, EngineError> {
    WeeklyPeriod::find_active(&state.db, user_id)
        .await?
        .map(Json)
        .ok_or(EngineError::NotFound("active period"))
}
