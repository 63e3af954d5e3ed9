//! Shared handler state.

use crate::services::weather_service::WeatherService;

pub struct AppState {
    pub weather: WeatherService,
}

impl AppState {
    pub fn new(weather: WeatherService) -> Self {
        Self { weather }
    }
}
