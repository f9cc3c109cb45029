use config::{Case, Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;

/// Base URL of the OpenWeatherMap 2.5 API
pub const OPENWEATHERMAP_API_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// OpenWeatherMap API key, empty when unset so the server still starts
    #[serde(default)]
    pub openweathermap_api_key: String,

    /// Upstream base URL, only overridden in tests
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Runtime mode, controls how much detail a 500 response exposes
    #[serde(default)]
    pub environment: RuntimeMode,

    /// Directory holding the frontend bundle
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Timeout for a single upstream call
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Timeout for a whole request passing through the router
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Deployment mode. Anything other than "production" counts as development.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(from = "String")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }
}

impl From<String> for RuntimeMode {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            RuntimeMode::Production
        } else {
            RuntimeMode::Development
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("openweathermap_api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("environment", &self.environment)
            .field("public_dir", &self.public_dir)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_api_base_url() -> String {
    OPENWEATHERMAP_API_URL.to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Start with default values
            .set_default("host", default_host())?
            .set_default("port", default_port())?
            .set_default("api_base_url", default_api_base_url())?
            .set_default("public_dir", default_public_dir())?
            // Load from config file if present
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config.local").required(false))
            // Override with environment variables (prefixed with WEATHER_DASHBOARD_)
            .add_source(
                Environment::with_prefix("WEATHER_DASHBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .convert_case(Case::Snake)
                    .try_parsing(true),
            )
            // Plain variables used by existing deployments win over everything
            .set_override_option("port", std::env::var("PORT").ok())?
            .set_override_option(
                "openweathermap_api_key",
                std::env::var("OPENWEATHERMAP_API_KEY").ok(),
            )?
            .set_override_option("environment", std::env::var("NODE_ENV").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configuration suitable for tests: a fake key pointed at `api_base_url`
    #[cfg(test)]
    pub fn for_tests(api_base_url: &str) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            openweathermap_api_key: "test-key".to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            environment: RuntimeMode::Development,
            public_dir: default_public_dir(),
            upstream_timeout_secs: 2,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
