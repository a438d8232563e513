use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::AuthUser;
use crate::budget::estimator::basal_rate;
use crate::dates::today_utc;
use crate::db::AppState;
use crate::error::EngineError;
use crate::periods::repo::WeeklyPeriod;
use crate::profile::dto::ProfilePayload;
use crate::profile::repo::MetabolicProfile;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", put(upsert_profile))
        .route("/profile", get(get_profile))
}

#[instrument(skip(state, body))]
pub async fn upsert_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ProfilePayload>,
) -> Result<Json<MetabolicProfile>, EngineError> {
    // Rejects malformed measurements before anything is written.
    basal_rate(
        body.sex,
        body.weight_lb,
        body.height_in,
        body.birth_date,
        today_utc(),
    )?;
    if body.target_weight_lb <= 0.0 {
        return Err(EngineError::InvalidProfileInput(
            "target weight must be positive".into(),
        ));
    }

    let profile = MetabolicProfile::upsert(&state.db, user_id, &body).await?;

    if WeeklyPeriod::find_active(&state.db, user_id).await?.is_some() {
        info!(%user_id, "profile edited mid-period; budget unchanged until re-baseline");
    }

    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MetabolicProfile>, EngineError> {
    MetabolicProfile::find(&state.db, user_id)
        .await?
        .map(Json)
        .ok_or(EngineError::NotFound("metabolic profile"))
}
