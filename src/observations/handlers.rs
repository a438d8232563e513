use axum::{extract::State, routing::post, Json, Router};
use tracing::{debug, instrument};

use crate::auth::AuthUser;
use crate::db::AppState;
use crate::error::EngineError;
use crate::metrics::services::{self, RecalcReason};
use crate::observations::dto::{LogBurnRequest, LogConsumptionRequest, ObservationResponse};
use crate::observations::repo::DailyObservation;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/observations", post(log_consumption))
        .route("/observations/burn", post(log_burn))
}

/// Logging a day's intake is an observation write: it funnels into the
/// single recalculation entry point when a period covers the date.
#[instrument(skip(state, body))]
pub async fn log_consumption(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<LogConsumptionRequest>,
) -> Result<Json<ObservationResponse>, EngineError> {
    if body.consumed_kcal < 0.0 {
        return Err(EngineError::Validation(
            "consumed calories must not be negative".into(),
        ));
    }

    let observation =
        DailyObservation::upsert_consumed(&state.db, user_id, body.date, body.consumed_kcal, body.day_type)
            .await?;
    let metrics = recalculate_if_tracked(&state, user_id, body.date).await?;
    Ok(Json(ObservationResponse {
        observation,
        metrics,
    }))
}

/// Exercise-burn event: upsert the day's burned calories and recompute the
/// owning period's totals. Repeats on the same date overwrite, never append.
#[instrument(skip(state, body))]
pub async fn log_burn(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<LogBurnRequest>,
) -> Result<Json<ObservationResponse>, EngineError> {
    if body.burned_kcal < 0.0 {
        return Err(EngineError::Validation(
            "burned calories must not be negative".into(),
        ));
    }

    let observation =
        DailyObservation::upsert_burned(&state.db, user_id, body.date, body.burned_kcal).await?;
    let metrics = recalculate_if_tracked(&state, user_id, body.date).await?;
    Ok(Json(ObservationResponse {
        observation,
        metrics,
    }))
}

async fn recalculate_if_tracked(
    state: &AppState,
    user_id: uuid::Uuid,
    date: time::Date,
) -> Result<Option<crate::metrics::services::MetricsReport>, EngineError> {
    match services::recalculate(&state.db, user_id, date, RecalcReason::ObservationWrite).await {
        Ok(report) => Ok(Some(report)),
        Err(EngineError::NotFound(_)) => {
            // Baseline week or untracked date; nothing to recompute yet.
            debug!(%user_id, %date, "observation outside any active period");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
