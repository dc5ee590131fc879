use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat_stream", post(handlers::chat_stream))
        .with_state(state)
}

/// CORS policy admitting the single configured browser origin
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ApiError> {
    let origin = origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::internal(format!("Invalid CORS origin '{}'", origin)).with_details(e.to_string())
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}
