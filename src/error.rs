use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use time::Date;
use tracing::error;

/// Engine-level failures surfaced to callers.
///
/// Safety violations (`UnsafeBudgetFloor`, `MissingBaselineData`) block the
/// operation outright; incomplete history is not represented here because the
/// scorers degrade to documented neutral values instead of failing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid profile input: {0}")]
    InvalidProfileInput(String),

    #[error("{0}")]
    Validation(String),

    #[error("insufficient baseline data: {qualifying} qualifying days, {required} required")]
    InsufficientBaselineData { qualifying: usize, required: usize },

    #[error("synthesized daily target {target_kcal:.0} kcal is below the {floor_kcal:.0} kcal safety floor")]
    UnsafeBudgetFloor { target_kcal: f64, floor_kcal: f64 },

    #[error("no baseline data on record; refusing to fabricate a budget")]
    MissingBaselineData,

    #[error("period conflict: an active period already covers {start} - {end}")]
    PeriodConflict { start: Date, end: Date },

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    fn status(&self) -> StatusCode {
        match self {
            EngineError::InvalidProfileInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::InsufficientBaselineData { .. }
            | EngineError::UnsafeBudgetFloor { .. }
            | EngineError::MissingBaselineData
            | EngineError::PeriodConflict { .. } => StatusCode::CONFLICT,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidProfileInput(_) => "invalid_profile_input",
            EngineError::Validation(_) => "validation_error",
            EngineError::InsufficientBaselineData { .. } => "insufficient_baseline_data",
            EngineError::UnsafeBudgetFloor { .. } => "unsafe_budget_floor",
            EngineError::MissingBaselineData => "missing_baseline_data",
            EngineError::PeriodConflict { .. } => "period_conflict",
            EngineError::NotFound(_) => "not_found",
            EngineError::Database(_) => "database_error",
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "engine error");
        }
        // PeriodConflict means an upstream invariant broke; keep it loud.
        if let EngineError::PeriodConflict { start, end } = &self {
            error!(%start, %end, "refusing to create a second active period");
        }
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_violations_map_to_conflict() {
        let err = EngineError::UnsafeBudgetFloor {
            target_kcal: 1499.0,
            floor_kcal: 1500.0,
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "unsafe_budget_floor");
    }

    #[test]
    fn invalid_profile_maps_to_unprocessable() {
        let err = EngineError::InvalidProfileInput("weight must be positive".into());
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("weight must be positive"));
    }
}
