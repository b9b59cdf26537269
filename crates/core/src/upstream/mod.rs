//! Upstream metadata API integration.
//!
//! The only backend is TMDB, but the pipeline talks to it through the
//! [`MetadataSource`] trait so tests can swap in a mock.

mod tmdb;
mod types;

pub use tmdb::TmdbClient;
pub use types::UpstreamRecord;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::CacheKey;

/// Errors that can occur when looking up a record upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The call did not complete within the configured timeout.
    #[error("Request timed out after {0} ms")]
    Timeout(u128),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing or rejected token).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl UpstreamError {
    /// Short label used for metrics.
    pub fn status_label(&self) -> &'static str {
        match self {
            UpstreamError::HttpError(_) => "http_error",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::RateLimitExceeded => "rate_limited",
            UpstreamError::NotFound(_) => "not_found",
            UpstreamError::ApiError { .. } => "api_error",
            UpstreamError::ParseError(_) => "parse_error",
            UpstreamError::NotConfigured(_) => "not_configured",
        }
    }
}

/// A source of upstream metadata records.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the full record for one key.
    async fn fetch(&self, key: CacheKey) -> Result<UpstreamRecord, UpstreamError>;

    /// Backend name, for logs and metrics.
    fn name(&self) -> &'static str;
}
