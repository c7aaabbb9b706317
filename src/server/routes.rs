//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::upload::MAX_FILES_PER_REQUEST;
use super::AppState;
use crate::config::ServerSettings;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server);
    // Per-file limits are enforced while reading the form; this caps the
    // request as a whole.
    let body_limit = state
        .settings
        .server
        .max_upload_bytes()
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(1024 * 1024);

    Router::new()
        .route("/health", get(handlers::health))
        // Raw OCR text
        .route("/extract", post(handlers::extract_text))
        // Synchronous processing
        .route("/api/process", post(handlers::api_process))
        // Background jobs
        .route("/api/jobs", post(handlers::api_create_job))
        .route("/api/jobs/:job_id", get(handlers::api_job_status))
        .route("/api/jobs/:job_id/csv", get(handlers::api_job_csv))
        // Export of edited records
        .route("/api/export/csv", post(handlers::api_export_csv))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(settings: &ServerSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
