//! Route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MISSING_COORDINATES;
use crate::models::cache::CacheStats;
use crate::models::weather::WeatherData;
use crate::server::error::ApiError;
use crate::server::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStats,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /weather?lat=..&lon=..
pub async fn current_weather(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherData>> {
    let Query(query) = query.map_err(|rejection| {
        debug!("Rejecting malformed weather query: {}", rejection);
        ApiError::bad_request(rejection.body_text())
    })?;
    let (Some(lat), Some(lon)) = (non_blank(query.lat), non_blank(query.lon)) else {
        debug!("Rejecting weather request without coordinates");
        return Err(ApiError::bad_request(MISSING_COORDINATES));
    };

    let data = state.weather.current(&lat, &lon).await?;
    Ok(Json(data))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.weather.cache().stats(),
    })
}
