use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::service::{Resource, UpstreamError};
use crate::error::HttpError;
use crate::extractors::City;
use crate::impl_into_response;
use crate::AppState;

#[derive(Error, Debug)]
pub enum WeatherApiError {
    #[error("City parameter is required")]
    MissingCity,

    #[error("City not found")]
    CityNotFound,

    #[error("{}", .resource.failure_message())]
    Upstream { resource: Resource, detail: String },
}

impl WeatherApiError {
    fn from_upstream(resource: Resource, err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound(_) => Self::CityNotFound,
            other => Self::Upstream {
                resource,
                detail: other.to_string(),
            },
        }
    }
}

impl HttpError for WeatherApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCity => StatusCode::BAD_REQUEST,
            Self::CityNotFound => StatusCode::NOT_FOUND,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::Upstream { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }
}

impl_into_response!(WeatherApiError);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Health check endpoint, never touches the upstream provider
///
/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Weather API is running",
    })
}

/// Current weather, upstream body passed through unchanged
///
/// GET /api/weather/current?city=London
pub async fn get_current_weather(
    State(state): State<AppState>,
    City(city): City,
) -> Result<Json<Value>, WeatherApiError> {
    let weather = state
        .weather_service
        .get_current_weather(&city)
        .await
        .map_err(|e| WeatherApiError::from_upstream(Resource::Current, e))?;
    Ok(Json(weather))
}

/// 5 day / 3 hour forecast, upstream body passed through unchanged
///
/// GET /api/weather/forecast?city=London
pub async fn get_forecast(
    State(state): State<AppState>,
    City(city): City,
) -> Result<Json<Value>, WeatherApiError> {
    let forecast = state
        .weather_service
        .get_forecast(&city)
        .await
        .map_err(|e| WeatherApiError::from_upstream(Resource::Forecast, e))?;
    Ok(Json(forecast))
}
