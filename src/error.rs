//! Error types for the request orchestrator
//!
//! Provides the typed error taxonomy using thiserror. Every error carries a
//! human-readable message and, where one exists, the HTTP status that caused it,
//! so calling layers can decide exit codes.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

// == Network Error Kind ==
/// Transport-level failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The remote end refused the connection
    ConnectionRefused,
    /// The connection was reset mid-flight
    ConnectionReset,
    /// Host name could not be resolved
    Dns,
    /// Connect or read deadline hit inside the transport
    TimedOut,
    /// Anything else; classified by message text
    Other,
}

// == Api Error Enum ==
/// Unified error type for orchestrated requests.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or rejected credentials (401/403 or no token at all)
    #[error("Authentication required: {message}")]
    Unauthenticated {
        status: Option<u16>,
        message: String,
        details: Option<Value>,
    },

    /// Requested resource does not exist (404)
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        details: Option<Value>,
    },

    /// Remote API is throttling us (429)
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        details: Option<Value>,
    },

    /// Remote API failed internally (5xx)
    #[error("Internal server error ({status}): {message}")]
    Internal {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Http {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// Transport failure before a response arrived
    #[error("Network error: {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    /// Attempt exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Circuit breaker rejected the attempt
    #[error("Circuit breaker is open: remote API is unavailable, try again later")]
    CircuitOpen,

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Substrings that mark an untyped failure as transient.
const TRANSIENT_MARKERS: &[&str] = &[
    "econnrefused",
    "enotfound",
    "etimedout",
    "econnreset",
    "connection refused",
    "connection reset",
    "timed out",
    "timeout",
    "rate limit",
    "429",
    "500",
    "502",
    "503",
    "504",
];

impl ApiError {
    // == Status ==
    /// HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthenticated { status, .. } => *status,
            ApiError::NotFound { .. } => Some(404),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::Internal { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    // == Code ==
    /// Stable machine-checkable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated { .. } => "UNAUTHENTICATED",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::Internal { .. } => "INTERNAL",
            ApiError::Http { .. } => "API_ERROR",
            ApiError::Network { .. } => "NETWORK",
            ApiError::Timeout(_) => "TIMEOUT",
            ApiError::CircuitOpen => "CIRCUIT_OPEN",
            ApiError::Decode(_) => "DECODE",
            ApiError::Config(_) => "CONFIG",
        }
    }

    // == Details ==
    /// Parsed response body attached to an HTTP-derived error.
    pub fn details(&self) -> Option<&Value> {
        match self {
            ApiError::Unauthenticated { details, .. }
            | ApiError::NotFound { details, .. }
            | ApiError::RateLimited { details, .. }
            | ApiError::Internal { details, .. }
            | ApiError::Http { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    // == Is Retryable ==
    /// Whether the retry loop may try again after this failure.
    ///
    /// Transient network conditions, 429 and 5xx are retryable. Client errors,
    /// authentication failures and an open circuit are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited { .. } | ApiError::Internal { .. } | ApiError::Timeout(_) => {
                true
            }
            ApiError::Http { status, .. } => is_retryable_status(*status),
            ApiError::Network { kind, message } => match kind {
                NetworkErrorKind::Other => message_indicates_transient(message),
                _ => true,
            },
            ApiError::Unauthenticated { .. }
            | ApiError::NotFound { .. }
            | ApiError::CircuitOpen
            | ApiError::Decode(_)
            | ApiError::Config(_) => false,
        }
    }
}

/// 429 and every 5xx.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Classifies a free-form failure description.
pub fn message_indicates_transient(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

// == Error Factory ==
/// Maps a non-success HTTP status onto the typed taxonomy.
pub fn error_from_status(status: u16, message: impl Into<String>, details: Option<Value>) -> ApiError {
    let message = message.into();
    match status {
        401 | 403 => ApiError::Unauthenticated {
            status: Some(status),
            message,
            details,
        },
        404 => ApiError::NotFound { message, details },
        429 => ApiError::RateLimited { message, details },
        500..=599 => ApiError::Internal {
            status,
            message,
            details,
        },
        _ => ApiError::Http {
            status,
            message,
            details,
        },
    }
}

// == Result Type Alias ==
/// Convenience Result type for the orchestrator.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_from_status_mapping() {
        assert!(matches!(
            error_from_status(401, "bad token", None),
            ApiError::Unauthenticated { status: Some(401), .. }
        ));
        assert!(matches!(
            error_from_status(403, "forbidden", None),
            ApiError::Unauthenticated { status: Some(403), .. }
        ));
        assert!(matches!(error_from_status(404, "gone", None), ApiError::NotFound { .. }));
        assert!(matches!(error_from_status(429, "slow down", None), ApiError::RateLimited { .. }));
        assert!(matches!(
            error_from_status(503, "unavailable", None),
            ApiError::Internal { status: 503, .. }
        ));
        assert!(matches!(
            error_from_status(422, "invalid", None),
            ApiError::Http { status: 422, .. }
        ));
    }

    #[test]
    fn test_http_errors_retryability() {
        assert!(error_from_status(429, "", None).is_retryable());
        for status in [500, 502, 503, 504] {
            assert!(error_from_status(status, "", None).is_retryable(), "{status}");
        }
        for status in [400, 401, 403, 404, 409, 422] {
            assert!(!error_from_status(status, "", None).is_retryable(), "{status}");
        }
    }

    #[test]
    fn test_status_and_details_preserved() {
        let body = json!({"message": "no such project"});
        let err = error_from_status(404, "no such project", Some(body.clone()));
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.details(), Some(&body));
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.to_string().contains("no such project"));
    }

    #[test]
    fn test_auth_errors_keep_details() {
        let body = json!({"message": "JWT expired", "code": "token_expired"});
        for status in [401, 403] {
            let err = error_from_status(status, "JWT expired", Some(body.clone()));
            assert_eq!(err.status(), Some(status));
            assert_eq!(err.details(), Some(&body));
            assert_eq!(err.code(), "UNAUTHENTICATED");
        }
    }

    #[test]
    fn test_network_errors_retryable() {
        for kind in [
            NetworkErrorKind::ConnectionRefused,
            NetworkErrorKind::ConnectionReset,
            NetworkErrorKind::Dns,
            NetworkErrorKind::TimedOut,
        ] {
            let err = ApiError::Network {
                kind,
                message: "boom".to_string(),
            };
            assert!(err.is_retryable());
        }
        assert!(ApiError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_untyped_network_error_classified_by_message() {
        let transient = ApiError::Network {
            kind: NetworkErrorKind::Other,
            message: "connect ECONNREFUSED 127.0.0.1:443".to_string(),
        };
        assert!(transient.is_retryable());

        let throttled = ApiError::Network {
            kind: NetworkErrorKind::Other,
            message: "Rate limit exceeded".to_string(),
        };
        assert!(throttled.is_retryable());

        let permanent = ApiError::Network {
            kind: NetworkErrorKind::Other,
            message: "invalid certificate".to_string(),
        };
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn test_circuit_open_and_auth_not_retryable() {
        assert!(!ApiError::CircuitOpen.is_retryable());
        assert_eq!(ApiError::CircuitOpen.code(), "CIRCUIT_OPEN");
        let auth = ApiError::Unauthenticated {
            status: None,
            message: "no token".to_string(),
            details: None,
        };
        assert!(!auth.is_retryable());
        assert_eq!(auth.status(), None);
    }

    #[test]
    fn test_message_markers() {
        assert!(message_indicates_transient("getaddrinfo ENOTFOUND api.example.com"));
        assert!(message_indicates_transient("operation timed out"));
        assert!(message_indicates_transient("upstream returned 502"));
        assert!(!message_indicates_transient("permission denied"));
    }
}
