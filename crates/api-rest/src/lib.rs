//! # API REST
//!
//! REST API implementation for the country mirror.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON error envelopes, CORS, request tracing)
//!
//! All data operations are delegated to `countries-core`.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod error;
pub mod handlers;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use countries_core::CountryService;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: CountryService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_countries,
        handlers::get_country,
        handlers::delete_country,
        handlers::refresh_countries,
        handlers::summary_image,
        handlers::status,
    ),
    components(schemas(
        dto::CountryRes,
        dto::DeleteCountryRes,
        dto::RefreshRes,
        dto::StatusRes,
        dto::ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Build the full router: API routes, Swagger UI, JSON 404/405 bodies, CORS, tracing and
/// panic handling.
pub fn router(service: CountryService) -> Router {
    Router::new()
        .route("/countries", get(handlers::list_countries))
        .route("/countries/refresh", post(handlers::refresh_countries))
        .route("/countries/image", get(handlers::summary_image))
        .route(
            "/countries/:name",
            get(handlers::get_country).delete(handlers::delete_country),
        )
        .route("/status", get(handlers::status))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::fallback)
        .layer(middleware::map_response(handlers::method_not_allowed))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}
