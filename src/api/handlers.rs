//! API Handlers
//!
//! HTTP request handlers for each diagnostics endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::client::{cache_key, RequestOrchestrator};
use crate::models::{CircuitResponse, HealthResponse, InvalidateResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// The orchestrator already guards its cache and breaker internally, so the
/// state only needs shared ownership.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: RequestOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Handler for GET /health
///
/// Reports breaker state and cache occupancy. Returns 200 even while the
/// circuit is open; `status` reads "degraded" in that case.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;

    Json(HealthResponse::new(
        orchestrator.circuit_state(),
        orchestrator.circuit_failure_count(),
        orchestrator.max_attempts(),
        orchestrator.cache_size().await,
        orchestrator.is_cache_enabled().await,
    ))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.orchestrator.cache_stats().await))
}

/// Handler for POST /circuit/reset
pub async fn reset_circuit_handler(State(state): State<AppState>) -> Json<CircuitResponse> {
    state.orchestrator.reset_circuit();
    info!("circuit breaker reset via diagnostics API");

    Json(CircuitResponse::reset(state.orchestrator.circuit_state()))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.orchestrator.clear_cache().await;
    info!(removed, "cache cleared via diagnostics API");

    Json(InvalidateResponse::new("*", removed))
}

/// Handler for DELETE /cache/:resource_type
///
/// Drops every entry under `resource_type:`.
pub async fn invalidate_namespace_handler(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.orchestrator.invalidate(&resource_type, None).await;

    Json(InvalidateResponse::new(resource_type, removed))
}

/// Handler for DELETE /cache/:resource_type/:resource_id
pub async fn invalidate_entry_handler(
    State(state): State<AppState>,
    Path((resource_type, resource_id)): Path<(String, String)>,
) -> Json<InvalidateResponse> {
    let removed = state
        .orchestrator
        .invalidate(&resource_type, Some(&resource_id))
        .await;

    Json(InvalidateResponse::new(
        cache_key(&resource_type, &resource_id),
        removed,
    ))
}
