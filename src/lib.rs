pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;

// Re-export commonly used items
pub use config::{Config, ConfigLoader};
pub use error::{Error, Result};
pub use models::cache::ExpiringCache;
pub use server::ApiServer;
pub use services::weather_service::WeatherService;
