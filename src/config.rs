//! Service configuration.
//!
//! Precedence (lowest to highest):
//! 1. Programmatic defaults
//! 2. `config.yaml` in the working directory, or the file given with `--config`
//! 3. Environment variables (`WEATHER_PROXY_*`, `__` separates nested keys,
//!    e.g. `WEATHER_PROXY_CACHE__EXPIRATION=30s`)
//! 4. Command-line flags, applied by the binary

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::openweather::{UpstreamConfig, DEFAULT_BASE_URL};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Figment(#[from] figment::Error),

    #[error("Config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("openweathermap.api_key must be set")]
    MissingApiKey,

    #[error("Invalid duration for {key}: '{value}' ({reason})")]
    InvalidDuration {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{0} is too large to schedule")]
    DurationTooLarge(&'static str),

    #[error("server.port must be between 1 and 65535")]
    InvalidPort,

    #[error("Invalid server.host: {0}")]
    InvalidHost(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub openweathermap: OpenWeatherSettings,
    pub cache: CacheSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWeatherSettings {
    pub api_key: String,
    pub base_url: String,
    /// Upstream request timeout, e.g. `10s`.
    pub timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Time-to-live of a cached response, e.g. `10m`.
    pub expiration: String,
    pub sweep_interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweathermap: OpenWeatherSettings {
                api_key: String::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: "10s".to_string(),
            },
            cache: CacheSettings {
                expiration: "10m".to_string(),
                sweep_interval: "1m".to_string(),
            },
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
        }
    }
}

impl Config {
    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        positive_duration("cache.expiration", &self.cache.expiration)
    }

    pub fn sweep_interval(&self) -> Result<Duration, ConfigError> {
        positive_duration("cache.sweep_interval", &self.cache.sweep_interval)
    }

    pub fn upstream(&self) -> Result<UpstreamConfig, ConfigError> {
        let api_key = self.openweathermap.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(UpstreamConfig {
            api_key: api_key.to_string(),
            base_url: self.openweathermap.base_url.clone(),
            timeout: positive_duration("openweathermap.timeout", &self.openweathermap.timeout)?,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Checks every derived setting so startup fails before anything is bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.upstream()?;
        self.cache_ttl()?;
        self.sweep_interval()?;
        self.bind_addr()?;
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub const DEFAULT_FILE: &'static str = "config.yaml";
    pub const ENV_PREFIX: &'static str = "WEATHER_PROXY_";

    /// Loads the layered configuration. An explicit `path` must exist; the
    /// default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            Some(path) => figment = figment.merge(Yaml::file(path)),
            None if Path::new(Self::DEFAULT_FILE).exists() => {
                figment = figment.merge(Yaml::file(Self::DEFAULT_FILE));
            }
            None => {}
        }

        let config = figment
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }
}

fn positive_duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let duration = parse_duration(value).map_err(|reason| ConfigError::InvalidDuration {
        key,
        value: value.to_string(),
        reason,
    })?;
    if duration.is_zero() {
        return Err(ConfigError::ZeroDuration(key));
    }
    // Deadlines are computed as `now + duration`, which must not overflow.
    if Instant::now().checked_add(duration).is_none() {
        return Err(ConfigError::DurationTooLarge(key));
    }
    Ok(duration)
}

/// Parses durations such as `500ms`, `30s`, `10m` or `1h30m`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("expected a number at '{}'", rest));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| "number out of range".to_string())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            "" => return Err("missing unit, expected one of ms, s, m, h".to_string()),
            other => return Err(format!("unknown unit '{}'", other)),
        }
        .ok_or_else(|| "duration out of range".to_string())?;
        rest = &rest[unit_len..];

        total = total
            .checked_add(part)
            .ok_or_else(|| "duration out of range".to_string())?;
    }

    Ok(total)
}
