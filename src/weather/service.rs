use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::models::{CurrentConditions, CurrentWeatherResult, DailySample, ForecastResult};
use crate::config::AppConfig;

/// The page renders °C, so temperatures are always requested in metric
const UNITS: &str = "metric";

/// Upstream resources the dashboard reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Current,
    Forecast,
}

impl Resource {
    fn path(self) -> &'static str {
        match self {
            Self::Current => "weather",
            Self::Forecast => "forecast",
        }
    }

    /// Error text shown to callers when this resource cannot be fetched
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Current => "Failed to fetch weather data",
            Self::Forecast => "Failed to fetch forecast data",
        }
    }
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("City not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Api(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("{0}")]
    Request(reqwest::Error),
}

// The request URL carries the API key, so it never makes it into the error
impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.without_url())
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenWeatherMapError {
    message: String,
}

pub struct WeatherService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherService {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.openweathermap_api_key.clone(),
        }
    }

    /// Current conditions for `city`, returned exactly as the provider sent them
    pub async fn get_current_weather(&self, city: &str) -> Result<Value, UpstreamError> {
        let payload = self.fetch(Resource::Current, city).await?;

        match CurrentWeatherResult::deserialize(&payload) {
            Ok(weather) => {
                let conditions = CurrentConditions::from(&weather);
                tracing::info!(
                    city = %conditions.location,
                    temp = %conditions.temperature,
                    description = %conditions.description,
                    humidity = %conditions.humidity,
                    wind = %conditions.wind,
                    "Weather data fetched successfully"
                );
            }
            Err(e) => tracing::warn!(city = %city, error = %e, "Unexpected weather payload shape"),
        }

        Ok(payload)
    }

    /// 5 day / 3 hour forecast for `city`, returned exactly as the provider sent it
    pub async fn get_forecast(&self, city: &str) -> Result<Value, UpstreamError> {
        let payload = self.fetch(Resource::Forecast, city).await?;

        match ForecastResult::deserialize(&payload) {
            Ok(forecast) => {
                let days: Vec<String> = forecast
                    .daily()
                    .into_iter()
                    .map(|entry| {
                        let sample = DailySample::local(entry);
                        format!("{} {} {}", sample.weekday, sample.temperature, sample.description)
                    })
                    .collect();
                let name = forecast.city.as_ref().map_or(city, |c| c.name.as_str());
                tracing::info!(
                    city = %name,
                    samples = forecast.list.len(),
                    days = ?days,
                    "Forecast data fetched successfully"
                );
            }
            Err(e) => tracing::warn!(city = %city, error = %e, "Unexpected forecast payload shape"),
        }

        Ok(payload)
    }

    async fn fetch(&self, resource: Resource, city: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", self.base_url, resource.path());
        tracing::debug!(city = %city, resource = ?resource, "Calling OpenWeatherMap");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("units", UNITS),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, resource = ?resource, "Received API response");

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(city.to_string()));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenWeatherMapError>(&text)
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("Request failed with status code {}", status.as_u16()));
            tracing::error!(status = %status, message = %message, "OpenWeatherMap request failed");
            return Err(UpstreamError::Api(message));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> WeatherService {
        let config = AppConfig::for_tests(&server.uri());
        WeatherService::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_current_weather_sends_query_and_passes_body_through() {
        let server = MockServer::start().await;
        let body = json!({
            "name": "London",
            "sys": { "country": "GB" },
            "main": { "temp": 15.4, "humidity": 60 },
            "weather": [{ "description": "clear sky" }],
            "wind": { "speed": 3.1 },
            "extra": { "kept": true }
        });

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let payload = service_for(&server).get_current_weather("London").await.unwrap();
        assert_eq!(payload, body);
    }

    #[tokio::test]
    async fn test_forecast_uses_forecast_resource() {
        let server = MockServer::start().await;
        let body = json!({ "list": [], "city": { "name": "Paris", "country": "FR" } });

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let payload = service_for(&server).get_forecast("Paris").await.unwrap();
        assert_eq!(payload, body);
    }

    #[tokio::test]
    async fn test_not_found_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&server)
            .await;

        let err = service_for(&server)
            .get_current_weather("Nowhereland")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::NotFound(city) if city == "Nowhereland"));
    }

    #[tokio::test]
    async fn test_api_error_carries_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "cod": 401,
                "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
            })))
            .mount(&server)
            .await;

        let err = service_for(&server).get_current_weather("London").await.unwrap_err();
        match err {
            UpstreamError::Api(message) => assert!(message.starts_with("Invalid API key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_without_message_uses_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = service_for(&server).get_forecast("London").await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status code 502");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let service = WeatherService::new(client, &AppConfig::for_tests(&server.uri()));

        let err = service.get_current_weather("London").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout));
    }

    #[tokio::test]
    async fn test_connection_error_does_not_leak_api_key() {
        // Nothing listens on port 9 (discard) in the test environment
        let config = AppConfig::for_tests("http://127.0.0.1:9");
        let service = WeatherService::new(Client::new(), &config);

        let err = service.get_current_weather("London").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Request(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(Resource::Current.failure_message(), "Failed to fetch weather data");
        assert_eq!(Resource::Forecast.failure_message(), "Failed to fetch forecast data");
    }
}
