//! Integration Tests for the Diagnostics API
//!
//! Tests the full request/response cycle for each endpoint against an
//! orchestrator whose breaker and cache state are set up directly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use resilient_api::client::{HttpRequest, HttpResponse, HttpTransport, StaticTokenProvider};
use resilient_api::clock::ManualClock;
use resilient_api::error::Result;
use resilient_api::{api::create_router, AppState, Config, RequestOptions, RequestOrchestrator};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

/// Every call fails with a 500.
struct FailingTransport;

#[async_trait]
impl HttpTransport for FailingTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
        Ok(HttpResponse::new(500, r#"{"message":"boom"}"#))
    }
}

fn create_test_state() -> AppState {
    let mut config = Config::default();
    config.retry.max_attempts = 1;
    config.circuit_breaker.threshold = 2;
    config.circuit_breaker.cooldown = Duration::from_secs(60);

    let orchestrator = RequestOrchestrator::from_config_with_clock(
        &config,
        Arc::new(StaticTokenProvider::new("token")),
        Arc::new(FailingTransport),
        ManualClock::shared(),
    );
    AppState::new(orchestrator)
}

async fn seed_cache(state: &AppState) {
    let mut cache = state.orchestrator.cache().write().await;
    cache.set("projects:p-1", json!({"id": "p-1"}), None);
    cache.set("projects:p-2", json!({"id": "p-2"}), None);
    cache.set("branches:b-1", json!({"id": "b-1"}), None);
}

async fn trip_breaker(state: &AppState) {
    for _ in 0..2 {
        let _ = state
            .orchestrator
            .enhanced_fetch("/projects", RequestOptions::get())
            .await;
    }
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_reports_closed_circuit() {
    let state = create_test_state();
    seed_cache(&state).await;

    let (status, json) = send(create_router(state), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["circuit_state"], "closed");
    assert_eq!(json["circuit_open"], false);
    assert_eq!(json["cache_size"], 3);
    assert_eq!(json["max_attempts"], 1);
    assert_eq!(json["cache_enabled"], true);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_reports_open_circuit() {
    let state = create_test_state();
    trip_breaker(&state).await;

    let (status, json) = send(create_router(state), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["circuit_state"], "open");
    assert_eq!(json["circuit_open"], true);
    assert_eq!(json["failure_count"], 2);
}

// == Circuit Reset Tests ==

#[tokio::test]
async fn test_reset_closes_open_circuit() {
    let state = create_test_state();
    trip_breaker(&state).await;
    assert!(state.orchestrator.is_circuit_open());

    let (status, json) = send(create_router(state.clone()), "POST", "/circuit/reset").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["circuit_state"], "closed");
    assert!(!state.orchestrator.is_circuit_open());
    assert_eq!(state.orchestrator.circuit_failure_count(), 0);
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_counts_hits_and_misses() {
    let state = create_test_state();
    seed_cache(&state).await;
    {
        let mut cache = state.orchestrator.cache().write().await;
        cache.get("projects:p-1");
        cache.get("projects:p-1");
        cache.get("projects:p-3");
    }

    let (status, json) = send(create_router(state), "GET", "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 2);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 3);
    let hit_rate = json["hit_rate"].as_f64().unwrap();
    assert!((hit_rate - 2.0 / 3.0).abs() < 0.001);
}

// == Cache Invalidation Tests ==

#[tokio::test]
async fn test_clear_cache_removes_everything() {
    let state = create_test_state();
    seed_cache(&state).await;

    let (status, json) = send(create_router(state.clone()), "DELETE", "/cache").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 3);
    assert_eq!(state.orchestrator.cache_size().await, 0);
}

#[tokio::test]
async fn test_invalidate_namespace_is_scoped() {
    let state = create_test_state();
    seed_cache(&state).await;

    let (status, json) = send(create_router(state.clone()), "DELETE", "/cache/projects").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 2);
    assert_eq!(state.orchestrator.cache_size().await, 1);
}

#[tokio::test]
async fn test_invalidate_single_entry() {
    let state = create_test_state();
    seed_cache(&state).await;

    let (status, json) =
        send(create_router(state.clone()), "DELETE", "/cache/projects/p-2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);
    assert!(json["message"].as_str().unwrap().contains("projects:p-2"));
    assert_eq!(state.orchestrator.cache_size().await, 2);
}

#[tokio::test]
async fn test_invalidate_unknown_namespace_removes_nothing() {
    let state = create_test_state();
    seed_cache(&state).await;

    let (status, json) = send(create_router(state.clone()), "DELETE", "/cache/regions").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 0);
    assert_eq!(state.orchestrator.cache_size().await, 3);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = send(create_router(create_test_state()), "GET", "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
