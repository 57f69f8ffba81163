//! Provider error types.

use std::sync::Arc;

/// Errors from the place/route provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Provider returned an error status code
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    /// Rate limited by the provider
    #[error("rate limited by provider")]
    RateLimited,

    /// Provider cannot be used as configured
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// An error from a fetch shared between concurrent callers
    #[error(transparent)]
    Shared(Arc<ProviderError>),
}

impl ProviderError {
    /// HTTP-like status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Http(e) => e.status().map(|s| s.as_u16()),
            ProviderError::Api { status, .. } => Some(*status),
            ProviderError::RateLimited => Some(429),
            ProviderError::Shared(e) => e.status(),
            ProviderError::Json { .. } | ProviderError::NotConfigured(_) => None,
        }
    }
}
