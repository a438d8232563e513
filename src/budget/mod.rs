pub mod dto;
pub mod estimator;
pub mod handlers;
pub mod synthesizer;

use crate::db::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
