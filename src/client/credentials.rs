//! Bearer token sources.
//!
//! Token acquisition and storage live elsewhere; the orchestrator only asks for
//! an already-valid token once per call. An empty token counts as no token.

use std::env;

/// Supplies the bearer token for outgoing requests.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Any `Fn() -> Option<String>` is a provider.
impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        non_empty(self())
    }
}

/// Fixed token, or a fixed absence of one.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A provider that never has a token.
    pub fn none() -> Self {
        Self { token: None }
    }
}

impl CredentialProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        non_empty(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub const DEFAULT_VAR: &'static str = "API_TOKEN";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl CredentialProvider for EnvTokenProvider {
    fn token(&self) -> Option<String> {
        non_empty(env::var(&self.var).ok())
    }
}

fn non_empty(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
