mod app;
mod auth;
mod baseline;
mod budget;
mod config;
mod dates;
mod db;
mod error;
mod jobs;
mod metrics;
mod observations;
mod periods;
mod profile;
mod reservations;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "kcalweek=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Schema is managed outside this service; no migrations run here.
    let state = db::AppState::init().await?;
    let app = app::build_app(state);
    app::serve(app).await
}
