//! Request orchestrator
//!
//! Composition point for every call to the remote API:
//! - injects the bearer token
//! - runs each network attempt under the retry handler (and through it the breaker)
//! - turns non-success responses into typed errors
//! - serves reads cache-aside and forgets affected namespaces after writes
//!
//! # Data Flow
//! ```text
//! read:  cache hit? → return
//!        miss → retry(send) → classify → cache.set(type:id, ttl(type)) → return
//! write: retry(send) → classify → invalidate(namespaces) → return
//! ```
//!
//! Cache and breaker locks are taken and released around each step; none is
//! held while a request is in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{self, CacheStats, CacheStore, SharedCache};
use crate::clock::{SharedClock, SystemClock};
use crate::config::Config;
use crate::error::{error_from_status, ApiError, Result};
use crate::resilience::{CircuitBreaker, CircuitState, RetryHandler};

use super::credentials::CredentialProvider;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use super::ttl::TtlTable;

/// Builds the `"{resource_type}:{resource_id}"` cache key.
pub fn cache_key(resource_type: &str, resource_id: &str) -> String {
    format!("{}:{}", resource_type, resource_id)
}

// == Request Options ==
/// Method, extra headers and optional JSON body for one call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self::with_body(Method::POST, body)
    }

    pub fn put(body: Value) -> Self {
        Self::with_body(Method::PUT, body)
    }

    pub fn patch(body: Value) -> Self {
        Self::with_body(Method::PATCH, body)
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn with_body(method: Method, body: Value) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: Some(body),
        }
    }
}

// == Request Orchestrator ==
#[derive(Clone)]
pub struct RequestOrchestrator {
    cache: SharedCache<Value>,
    retry: RetryHandler,
    credentials: Arc<dyn CredentialProvider>,
    transport: Arc<dyn HttpTransport>,
    ttls: TtlTable,
    base_url: String,
    request_timeout: Duration,
}

impl RequestOrchestrator {
    /// Wires already-built collaborators together.
    ///
    /// Uses the built-in TTL table, no base URL and a 30 second attempt timeout.
    pub fn new(
        cache: SharedCache<Value>,
        retry: RetryHandler,
        credentials: Arc<dyn CredentialProvider>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            cache,
            retry,
            credentials,
            transport,
            ttls: TtlTable::default(),
            base_url: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Builds cache, breaker and retry handler from configuration on the system clock.
    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialProvider>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::from_config_with_clock(config, credentials, transport, SystemClock::shared())
    }

    pub fn from_config_with_clock(
        config: &Config,
        credentials: Arc<dyn CredentialProvider>,
        transport: Arc<dyn HttpTransport>,
        clock: SharedClock,
    ) -> Self {
        let cache = cache::shared(CacheStore::from_config(&config.cache, clock.clone()));
        let breaker = Arc::new(CircuitBreaker::from_config(&config.circuit_breaker, clock));
        let retry = RetryHandler::from_config(&config.retry, breaker);

        Self::new(cache, retry, credentials, transport)
            .with_base_url(config.api.base_url.clone())
            .with_request_timeout(config.api.request_timeout)
    }

    pub fn with_ttl_table(mut self, ttls: TtlTable) -> Self {
        self.ttls = ttls;
        self
    }

    /// Root that relative paths passed to [`enhanced_fetch`](Self::enhanced_fetch) are joined to.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Deadline for each individual attempt.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    // == Cached Fetch ==
    /// Cache-aside read of `resource_type:resource_id`.
    ///
    /// On a hit `fetcher` is not called. On a miss its result is stored with
    /// `ttl`, or the resource type's TTL, or the cache default, in that order.
    /// Errors from `fetcher` are returned as-is and nothing is cached.
    pub async fn cached_fetch<F, Fut>(
        &self,
        resource_type: &str,
        resource_id: &str,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let key = cache_key(resource_type, resource_id);

        let cached = self.cache.write().await.get(&key);
        if let Some(value) = cached {
            debug!(%key, "cache hit");
            return Ok(value);
        }

        debug!(%key, "cache miss");
        let value = fetcher().await?;

        let ttl = ttl.or_else(|| self.ttls.get(resource_type));
        self.cache.write().await.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// GET `url` through the cache under `resource_type:resource_id`.
    pub async fn fetch_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
        url: &str,
    ) -> Result<Value> {
        self.cached_fetch(
            resource_type,
            resource_id,
            || self.enhanced_fetch(url, RequestOptions::get()),
            None,
        )
        .await
    }

    // == Enhanced Fetch ==
    /// Authenticated call with retries and typed error classification.
    ///
    /// Returns the parsed JSON body, or `Value::Null` when the response has no body.
    pub async fn enhanced_fetch(&self, url: &str, options: RequestOptions) -> Result<Value> {
        let token = self
            .credentials
            .token()
            .ok_or_else(|| ApiError::Unauthenticated {
                status: None,
                message: "no API token available, log in or set an API key".to_string(),
                details: None,
            })?;

        let body = options.body.as_ref().map(serde_json::to_vec).transpose()?;

        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {}", token)),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers.extend(options.headers);

        let request = HttpRequest {
            method: options.method,
            url: self.resolve_url(url),
            headers,
            body,
        };

        let result = self.retry.execute(|| self.attempt(request.clone())).await;
        match &result {
            Ok(_) => debug!(method = %request.method, url = %request.url, "request succeeded"),
            Err(err) => debug!(
                method = %request.method,
                url = %request.url,
                code = err.code(),
                error = %err,
                "request failed"
            ),
        }
        result
    }

    /// One network attempt bounded by the request timeout.
    async fn attempt(&self, request: HttpRequest) -> Result<Value> {
        let response =
            match tokio::time::timeout(self.request_timeout, self.transport.send(request)).await {
                Ok(result) => result?,
                Err(_) => return Err(ApiError::Timeout(self.request_timeout)),
            };

        if !response.is_success() {
            return Err(response_error(&response));
        }
        if response.has_no_content() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&response.body)?)
    }

    // == Mutate ==
    /// Write call that bypasses the cache and, on success, invalidates every
    /// namespace in `invalidates`.
    pub async fn mutate(
        &self,
        url: &str,
        options: RequestOptions,
        invalidates: &[&str],
    ) -> Result<Value> {
        let value = self.enhanced_fetch(url, options).await?;
        for resource_type in invalidates {
            self.invalidate(resource_type, None).await;
        }
        Ok(value)
    }

    // == Invalidate ==
    /// Forgets one entry (`Some(id)`) or a whole namespace (`None`).
    ///
    /// Returns how many entries were removed.
    pub async fn invalidate(&self, resource_type: &str, resource_id: Option<&str>) -> usize {
        let mut cache = self.cache.write().await;

        let removed = match resource_id {
            Some(id) => usize::from(cache.delete(&cache_key(resource_type, id))),
            None => {
                let prefix = format!("{}:", resource_type);
                let doomed: Vec<String> = cache
                    .keys()
                    .filter(|key| key.starts_with(&prefix))
                    .map(str::to_owned)
                    .collect();
                for key in &doomed {
                    cache.delete(key);
                }
                doomed.len()
            }
        };

        debug!(resource_type, resource_id = ?resource_id, removed, "invalidated cache entries");
        removed
    }

    // == Diagnostics ==
    pub fn is_circuit_open(&self) -> bool {
        self.retry.breaker().is_open()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.retry.breaker().state()
    }

    pub fn circuit_failure_count(&self) -> u32 {
        self.retry.breaker().failure_count()
    }

    pub fn reset_circuit(&self) {
        self.retry.breaker().reset();
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts()
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Drops every cached entry. Returns how many there were.
    pub async fn clear_cache(&self) -> usize {
        let mut cache = self.cache.write().await;
        let count = cache.len();
        cache.clear();
        count
    }

    pub async fn set_cache_enabled(&self, enabled: bool) {
        self.cache.write().await.set_enabled(enabled);
    }

    pub async fn is_cache_enabled(&self) -> bool {
        self.cache.read().await.is_enabled()
    }

    pub fn cache(&self) -> &SharedCache<Value> {
        &self.cache
    }

    pub fn retry_handler(&self) -> &RetryHandler {
        &self.retry
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || self.base_url.is_empty() {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}

/// Builds a typed error from a non-success response.
///
/// The message comes from the JSON body's `message` or `error` field when
/// present, then the raw body text, then the status reason.
fn response_error(response: &HttpResponse) -> ApiError {
    let raw = String::from_utf8_lossy(&response.body).trim().to_string();
    let details: Option<Value> = serde_json::from_str(&raw).ok();

    let message = details
        .as_ref()
        .and_then(extract_message)
        .or_else(|| (!raw.is_empty()).then(|| raw.clone()))
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", response.status))
        });

    error_from_status(response.status, message, details)
}

fn extract_message(body: &Value) -> Option<String> {
    ["message", "error", "error_description"]
        .iter()
        .find_map(|field| match body.get(field) {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Object(inner)) => inner
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
}
