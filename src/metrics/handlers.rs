use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::instrument;

use crate::auth::AuthUser;
use crate::dates::today_utc;
use crate::db::AppState;
use crate::error::EngineError;
use crate::metrics::dto::RecalculateRequest;
use crate::metrics::repo::WeeklyMetricSnapshot;
use crate::metrics::services::{self, MetricsReport, RecalcReason};
use crate::periods::repo::WeeklyPeriod;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/metrics/recalculate", post(recalculate))
        .route("/metrics", get(get_snapshot))
}

#[instrument(skip(state, body))]
pub async fn recalculate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<RecalculateRequest>,
) -> Result<Json<MetricsReport>, EngineError> {
    let date = body.date.unwrap_or_else(today_utc);
    let report =
        services::recalculate(&state.db, user_id, date, RecalcReason::Interactive).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
}

/// The stored snapshot row for the period covering `date`, as last written
/// by any of the three recalculation call sites.
#[instrument(skip(state))]
pub async fn get_snapshot(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SnapshotQuery>,
) -> Result<Json<WeeklyMetricSnapshot>, EngineError> {
    let period = WeeklyPeriod::find_covering(&state.db, user_id, q.date)
        .await?
        .ok_or(EngineError::NotFound("active period"))?;
    WeeklyMetricSnapshot::find(&state.db, user_id, period.id, q.date)
        .await?
        .map(Json)
        .ok_or(EngineError::NotFound("metric snapshot"))
}
