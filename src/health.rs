use axum::{extract::State, http::StatusCode, routing::get, Router};
use tracing::instrument;

use crate::{db, error::ApiError, state::AppState};

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}

pub async fn index() -> &'static str {
    "Account service"
}

#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Result<(StatusCode, &'static str), ApiError> {
    db::ping(&state.db)
        .await
        .map_err(|e| ApiError::internal("database_connection_error", e.to_string()))?;
    Ok((StatusCode::OK, "Healthy"))
}
