use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::dates::today_utc;
use crate::db::AppState;
use crate::error::EngineError;
use crate::reservations::dto::{AdjustedBudgetQuery, ReserveRequest};
use crate::reservations::repo::Reservation;
use crate::reservations::services::{self, AdjustedBudget};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reservations", post(reserve))
        .route("/budget/adjusted", get(adjusted_budget))
}

#[instrument(skip(state, body))]
pub async fn reserve(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ReserveRequest>,
) -> Result<Json<Reservation>, EngineError> {
    let as_of = body.as_of.unwrap_or_else(today_utc);
    let reservation = services::reserve(
        &state.db,
        user_id,
        body.date,
        body.planned_kcal,
        body.note.as_deref(),
        as_of,
    )
    .await?;
    Ok(Json(reservation))
}

#[instrument(skip(state))]
pub async fn adjusted_budget(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<AdjustedBudgetQuery>,
) -> Result<Json<AdjustedBudget>, EngineError> {
    let result = services::adjusted_budget(&state.db, user_id, q.date).await?;
    Ok(Json(result))
}
