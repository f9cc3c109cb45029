use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::weather::handlers::WeatherApiError;

/// Query parameters for weather/forecast requests
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    /// City name from query string
    pub city: Option<String>,
}

/// A validated, trimmed, non-empty `city` query parameter
///
/// A missing, blank or unparseable query is rejected with
/// `WeatherApiError::MissingCity` before any upstream call happens.
#[derive(Debug, PartialEq)]
pub struct City(pub String);

impl City {
    /// Trim `raw` and reject it if nothing is left
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|city| !city.is_empty())
            .map(|city| City(city.to_string()))
    }
}

impl<S> FromRequestParts<S> for City
where
    S: Send + Sync,
{
    type Rejection = WeatherApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let query = Query::<WeatherQuery>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Query(query)| query.city);

        City::parse(query.as_deref()).ok_or(WeatherApiError::MissingCity)
    }
}
