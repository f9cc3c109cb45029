mod config;
mod error;
mod extractors;
mod routes;
mod weather;

use reqwest::Client;
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::weather::WeatherService;

/// Shared HTTP client configuration
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

#[derive(Clone)]
pub struct AppState {
    pub weather_service: Arc<WeatherService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, http_client: Client) -> Self {
        let weather_service = Arc::new(WeatherService::new(http_client, &config));
        Self {
            weather_service,
            config: Arc::new(config),
        }
    }
}

/// Create shared HTTP client with connection pooling
///
/// The overall timeout bounds every upstream call.
fn create_http_client(config: &AppConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .pool_max_idle_per_host(10)
        .build()
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!(
        environment = ?config.environment,
        public_dir = %config.public_dir,
        "Configuration loaded successfully"
    );
    if config.openweathermap_api_key.trim().is_empty() {
        tracing::warn!("OpenWeatherMap API key is empty, upstream calls will be rejected");
    }

    let http_client = create_http_client(&config)?;
    tracing::debug!(
        timeout_secs = config.upstream_timeout_secs,
        "Shared HTTP client created"
    );

    let addr = config.bind_addr();
    let port = config.port;
    let app = routes::build_router(AppState::new(config, http_client));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Weather Dashboard server running on {}", addr);
    tracing::info!("Access the API at http://localhost:{}/api/health", port);
    tracing::info!("Access the frontend at http://localhost:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
