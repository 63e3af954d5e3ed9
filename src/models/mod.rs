pub mod cache;
pub mod weather;

pub use cache::{CacheError, CacheStats, ExpiringCache};
pub use weather::{WeatherData, WeatherDescription};
