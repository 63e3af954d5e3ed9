pub mod openweather;

pub use openweather::{OpenWeatherClient, UpstreamConfig, WeatherError};
