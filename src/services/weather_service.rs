use std::sync::Arc;

use tracing::{error, info};

use crate::api::openweather::OpenWeatherClient;
use crate::error::{Error, Result};
use crate::models::cache::ExpiringCache;
use crate::models::weather::WeatherData;

pub type WeatherCache = ExpiringCache<WeatherData>;

/// Serves current weather, going upstream only when the cache has nothing fresh.
pub struct WeatherService {
    client: OpenWeatherClient,
    cache: Arc<WeatherCache>,
}

impl WeatherService {
    pub fn new(client: OpenWeatherClient, cache: Arc<WeatherCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }

    /// Builds the `"lat,lon"` cache key.
    pub fn cache_key(lat: &str, lon: &str) -> String {
        format!("{},{}", lat.trim(), lon.trim())
    }

    pub async fn current(&self, lat: &str, lon: &str) -> Result<WeatherData> {
        let (lat, lon) = (lat.trim(), lon.trim());
        if lat.is_empty() || lon.is_empty() {
            return Err(Error::MissingCoordinates);
        }

        let key = Self::cache_key(lat, lon);
        let client = &self.client;
        let data = self
            .cache
            .get_or_fetch(&key, || {
                info!("Fetching weather for {}", key);
                client.fetch_current(lat, lon)
            })
            .await
            .map_err(|e| {
                error!("Failed to fetch weather for {}: {}", key, e);
                Error::from(e)
            })?;

        Ok(data)
    }
}
