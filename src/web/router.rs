//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;

use super::handlers::{
    delete_file, download_file, list_files, status, stream_file, upload_file, upload_multiple,
    AppState,
};
use super::middleware::{create_cors_layer, security_headers};

/// Convert a byte limit to the `usize` axum expects, saturating on 32-bit targets.
fn body_limit(bytes: u64) -> usize {
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, web_config: &WebConfig) -> Router {
    let limits = app_state.limits;

    // Upload routes carry their own body limits instead of axum's 2MB default
    let upload_routes = Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit(
                limits.single_request_bytes(),
            ))),
        )
        .route(
            "/upload/multiple",
            post(upload_multiple).layer(DefaultBodyLimit::max(body_limit(
                limits.batch_request_bytes(),
            ))),
        );

    let file_routes = Router::new()
        .route("/download/:filename", get(download_file))
        .route("/files", get(list_files))
        .route("/files/:filename", get(stream_file).delete(delete_file))
        .route("/status", get(status));

    let mut router = Router::new()
        .merge(upload_routes)
        .merge(file_routes)
        .with_state(app_state)
        .merge(create_health_router());

    if web_config.serve_static {
        if let Some(static_router) = create_static_router(&web_config.static_path) {
            router = router.merge(static_router);
        }
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&web_config.cors_origins))
            .layer(middleware::from_fn(security_headers)),
    )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create a router serving static files under `/assets`.
///
/// Returns `None` if the directory does not exist.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    if !Path::new(static_path).is_dir() {
        tracing::warn!("Static directory not found: {}", static_path);
        return None;
    }

    tracing::info!("Serving static files from {}", static_path);
    Some(Router::new().nest_service("/assets", ServeDir::new(static_path)))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
