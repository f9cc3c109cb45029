use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;

/// Message shown instead of internal detail when running in production
pub const GENERIC_SERVER_ERROR: &str = "An unexpected error occurred";

/// Standard error response format for all API errors
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

/// Trait for errors that can be converted to HTTP responses
///
/// The `Display` text becomes the `error` field of the body.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Optional detail rendered as the `message` field
    fn detail(&self) -> Option<String> {
        None
    }
}

/// Convert any HttpError into an Axum response
pub fn into_response<E: HttpError>(err: E) -> Response {
    let status = err.status_code();
    let detail = err.detail();
    let message = err.to_string();

    if status.is_server_error() {
        tracing::error!(error = %message, detail = ?detail, status = %status, "API error");
    } else {
        tracing::warn!(error = %message, status = %status, "API error");
    }

    let body = match detail {
        Some(detail) => ErrorResponse::with_message(message, detail),
        None => ErrorResponse::new(message),
    };

    (status, Json(body)).into_response()
}

/// Macro to implement IntoResponse for HttpError types
#[macro_export]
macro_rules! impl_into_response {
    ($error_type:ty) => {
        impl axum::response::IntoResponse for $error_type {
            fn into_response(self) -> axum::response::Response {
                $crate::error::into_response(self)
            }
        }
    };
}

/// Errors raised by the router itself rather than a handler
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    RouteNotFound,

    #[error("Server error")]
    Server(String),
}

impl AppError {
    /// Build a server error, hiding `detail` in production
    pub fn server(detail: impl Into<String>, production: bool) -> Self {
        if production {
            Self::Server(GENERIC_SERVER_ERROR.to_string())
        } else {
            Self::Server(detail.into())
        }
    }
}

impl HttpError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::RouteNotFound => Some("The requested resource does not exist".to_string()),
            Self::Server(detail) => Some(detail.clone()),
        }
    }
}

impl_into_response!(AppError);

/// Fallback for every path no route or static file answers
pub async fn not_found() -> AppError {
    AppError::RouteNotFound
}

/// Turn a handler panic into the generic 500 body
pub fn panic_response(err: Box<dyn Any + Send + 'static>, production: bool) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Unhandled error");

    AppError::server(detail, production).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_response_skips_missing_message() {
        let json = serde_json::to_value(ErrorResponse::new("City not found")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "City not found" }));
    }

    #[tokio::test]
    async fn test_route_not_found_body() {
        let response = AppError::RouteNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_of(response).await,
            ErrorResponse::with_message("Not found", "The requested resource does not exist")
        );
    }

    #[tokio::test]
    async fn test_panic_response_exposes_detail_in_development() {
        let response = panic_response(Box::new("boom"), false);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_of(response).await,
            ErrorResponse::with_message("Server error", "boom")
        );
    }

    #[tokio::test]
    async fn test_panic_response_hides_detail_in_production() {
        let response = panic_response(Box::new(String::from("db password wrong")), true);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_of(response).await,
            ErrorResponse::with_message("Server error", GENERIC_SERVER_ERROR)
        );
    }
}
