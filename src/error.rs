use thiserror::Error;

use crate::api::openweather::WeatherError;
use crate::config::ConfigError;
use crate::models::cache::CacheError;

pub const MISSING_COORDINATES: &str =
    "Latitude and longitude query parameters 'lat' and 'lon' are required";

#[derive(Debug, Error)]
pub enum Error {
    /// The caller did not supply usable coordinates.
    #[error("{}", MISSING_COORDINATES)]
    MissingCoordinates,

    #[error(transparent)]
    Upstream(#[from] WeatherError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CacheError<WeatherError>> for Error {
    fn from(err: CacheError<WeatherError>) -> Self {
        match err {
            CacheError::EmptyKey => Error::MissingCoordinates,
            CacheError::Fetch(err) => Error::Upstream(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_errors_convert() {
        let err: Error = ConfigError::MissingApiKey.into();
        assert!(matches!(err, Error::Config(ConfigError::MissingApiKey)));
        assert_eq!(err.to_string(), "openweathermap.api_key must be set");

        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_cache_errors_convert() {
        let err: Error = CacheError::<WeatherError>::EmptyKey.into();
        assert!(matches!(err, Error::MissingCoordinates));

        let upstream = WeatherError::Status {
            status: 503,
            body: "down".to_string(),
        };
        let err: Error = CacheError::Fetch(upstream).into();
        assert!(matches!(err, Error::Upstream(WeatherError::Status { status: 503, .. })));
    }
}
