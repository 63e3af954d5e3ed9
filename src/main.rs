use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use weather_proxy::api::OpenWeatherClient;
use weather_proxy::server::AppState;
use weather_proxy::services::WeatherCache;
use weather_proxy::{ApiServer, ConfigLoader, ExpiringCache, Result, WeatherService};

/// Caching proxy in front of the OpenWeatherMap current-weather API.
#[derive(Parser, Debug)]
#[command(name = "weather-proxy", version, about)]
struct Cli {
    /// YAML config file (defaults to ./config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding server.port
    #[arg(short, long)]
    port: Option<u16>,

    /// OpenWeatherMap API key, overriding openweathermap.api_key
    #[arg(long, env = "OPENWEATHERMAP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting weather proxy");

    let mut config = ConfigLoader::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(api_key) = cli.api_key {
        config.openweathermap.api_key = api_key;
    }
    config.validate()?;

    let ttl = config.cache_ttl()?;
    let sweep_interval = config.sweep_interval()?;
    let cache: Arc<WeatherCache> = Arc::new(ExpiringCache::new(ttl));
    debug!("Cache TTL {:?}, sweeping every {:?}", cache.ttl(), sweep_interval);
    let sweeper = cache.spawn_sweeper(sweep_interval);

    let client = OpenWeatherClient::new(config.upstream()?)?;
    let service = WeatherService::new(client, cache);
    let server = ApiServer::new(AppState::new(service));

    server.run(config.bind_addr()?).await?;

    sweeper.abort();
    info!("Shutting down");
    Ok(())
}
