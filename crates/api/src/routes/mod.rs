pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Everything nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/auth", auth::router())
}
