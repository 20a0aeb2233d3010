mod achievements;
mod health;
mod progress;

use axum::response::IntoResponse;
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/progress", progress::router())
        .nest("/api/achievements", achievements::router())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    AppError::not_found("route not found")
}
