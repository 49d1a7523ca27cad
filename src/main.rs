mod app;
mod bookings;
mod cars;
mod config;
mod db;
mod error;
mod extractors;
mod health;
mod pagination;
mod schema;
mod state;
mod time_range;
mod users;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "carbooking=debug,axum=info,tower_http=info".to_string());
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

    // missing DB_* variables abort startup here
    let config = AppConfig::from_env()?;

    schema::create_database(&config.db).await?;
    let app_state = AppState::init(&config.db).await?;
    schema::create_tables(&app_state.db).await?;

    let app = app::build_app(app_state);
    app::serve(app, &config.host, config.port).await
}
