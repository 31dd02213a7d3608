//! Remote API client core.
//!
//! [`RequestOrchestrator`] composes the shared cache, the retry handler (which
//! owns the circuit breaker), a [`CredentialProvider`] and an [`HttpTransport`].

mod credentials;
mod orchestrator;
mod transport;
mod ttl;

pub use credentials::{CredentialProvider, EnvTokenProvider, StaticTokenProvider};
pub use orchestrator::{cache_key, RequestOptions, RequestOrchestrator};
pub use transport::{
    classify_reqwest_error, HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport,
};
pub use ttl::TtlTable;
