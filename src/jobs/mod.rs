//! Endpoints for the external cron-like trigger. These run under the job
//! runner's own credential and batch over all users; they are not reachable
//! with a user session token.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use time::Date;
use tracing::instrument;

use crate::auth::JobAuth;
use crate::dates::today_utc;
use crate::db::AppState;
use crate::error::EngineError;
use crate::metrics::services::{snapshot_all, SnapshotStats};
use crate::periods::services::{rotate_due, RotationStats};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs/rotate-periods", post(rotate_periods))
        .route("/jobs/snapshot-metrics", post(snapshot_metrics))
}

#[derive(Debug, Default, Deserialize)]
pub struct JobRequest {
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub as_of: Option<Date>,
}

#[instrument(skip(state, body, _auth))]
pub async fn rotate_periods(
    State(state): State<AppState>,
    _auth: JobAuth,
    Json(body): Json<JobRequest>,
) -> Result<Json<RotationStats>, EngineError> {
    let as_of = body.as_of.unwrap_or_else(today_utc);
    let stats = rotate_due(&state.db, as_of).await?;
    Ok(Json(stats))
}

#[instrument(skip(state, body, _auth))]
pub async fn snapshot_metrics(
    State(state): State<AppState>,
    _auth: JobAuth,
    Json(body): Json<JobRequest>,
) -> Result<Json<SnapshotStats>, EngineError> {
    let as_of = body.as_of.unwrap_or_else(today_utc);
    let stats = snapshot_all(&state.db, as_of).await?;
    Ok(Json(stats))
}
