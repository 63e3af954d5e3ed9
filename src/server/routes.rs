use std::sync::Arc;

use axum::{routing::get, Router};

use crate::server::handlers;
use crate::server::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/weather", get(handlers::current_weather))
        .with_state(state)
}
