use axum::{
    error_handling::HandleErrorLayer,
    handler::HandlerWithoutStateExt,
    http::{header, Method},
    routing::get,
    BoxError, Router,
};
use std::{any::Any, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{self, AppError};
use crate::weather::handlers as weather_handlers;
use crate::AppState;

/// Build the weather API routes
fn weather_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/weather/current",
            get(weather_handlers::get_current_weather),
        )
        .route("/weather/forecast", get(weather_handlers::get_forecast))
}

/// Build all routes mounted under /api
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(weather_handlers::health))
        .merge(weather_routes())
        // A wrong method on a known path answers like an unknown path
        .method_not_allowed_fallback(error::not_found)
}

/// Permissive CORS: any origin, GET/POST, Content-Type and Authorization
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Handle errors raised by the request timeout layer
fn handle_timeout_error(err: BoxError, production: bool) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Server("Request timed out".to_string())
    } else {
        AppError::server(format!("Internal error: {}", err), production)
    }
}

/// Wrap a router in the timeout, panic, compression, trace and CORS layers
fn with_layers(router: Router<AppState>, config: &AppConfig) -> Router<AppState> {
    let production = config.environment.is_production();
    let request_timeout = Duration::from_secs(config.request_timeout_secs);

    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    handle_timeout_error(err, production)
                }))
                .timeout(request_timeout),
        )
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| error::panic_response(err, production),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Build the complete application router
///
/// API routes come first; anything else is looked up under `public_dir`
/// and answered with the JSON 404 body when no file matches.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(error::not_found.into_service());

    let router = Router::new()
        .nest("/api", api_routes())
        .fallback_service(static_files);

    with_layers(router, &state.config).with_state(state)
}
