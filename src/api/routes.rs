//! API Routes
//!
//! Configures the Axum router with the diagnostics endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{
    clear_cache_handler, health_handler, invalidate_entry_handler, invalidate_namespace_handler,
    reset_circuit_handler, stats_handler, AppState,
};

/// Creates the diagnostics router.
///
/// # Endpoints
/// - `GET /health` - Breaker state and cache occupancy
/// - `GET /stats` - Cache statistics
/// - `POST /circuit/reset` - Force the breaker closed
/// - `DELETE /cache` - Drop every cached entry
/// - `DELETE /cache/:resource_type` - Drop one namespace
/// - `DELETE /cache/:resource_type/:resource_id` - Drop one entry
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/circuit/reset", post(reset_circuit_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/:resource_type", delete(invalidate_namespace_handler))
        .route(
            "/cache/:resource_type/:resource_id",
            delete(invalidate_entry_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
