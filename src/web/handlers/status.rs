//! Status handler for Web API.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::StatusResponse;
use crate::web::handlers::AppState;

/// GET /status - Aggregate storage statistics.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let status = state.storage.status().await;

    if status.scan_failed {
        tracing::warn!("Reporting zero totals: upload directory unreadable");
    }

    Json(StatusResponse::from_status(status, &state.timezone))
}
