use crate::models::weather::WeatherData;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport failure, including the request timeout.
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("weather provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed weather payload: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    config: UpstreamConfig,
}

impl OpenWeatherClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Fetches current conditions for the given coordinates.
    ///
    /// Coordinates are forwarded as given; validating them is left to the provider.
    pub async fn fetch_current(&self, lat: &str, lon: &str) -> Result<WeatherData, WeatherError> {
        debug!("Requesting weather for lat={} lon={}", lat, lon);
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("lat", lat), ("lon", lon), ("appid", self.config.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Weather provider answered {} for lat={} lon={}", status, lat, lon);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: WeatherData = serde_json::from_str(&body)?;
        debug!("Parsed {} weather descriptions", data.weather.len());

        Ok(data)
    }
}
