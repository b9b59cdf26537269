//! TMDB (The Movie Database) API client.
//!
//! Records are fetched with a v4 read access token sent as a bearer
//! header. Responses are kept as opaque JSON objects.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{MetadataSource, UpstreamError, UpstreamRecord};
use crate::config::UpstreamConfig;
use crate::media::CacheKey;

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_token: String,
    language: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        if config.api_token.is_empty() {
            return Err(UpstreamError::NotConfigured(
                "TMDB API token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            language: config.language.clone(),
        })
    }

    fn record_url(&self, key: CacheKey) -> String {
        format!("{}/{}/{}", self.base_url, key.kind(), key.id())
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn fetch(&self, key: CacheKey) -> Result<UpstreamRecord, UpstreamError> {
        let url = self.record_url(key);

        debug!("TMDB get {}: id={}", key.kind(), key.id());

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("language", &self.language)])
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(UpstreamError::NotConfigured(
                "Invalid TMDB API token".to_string(),
            ));
        }
        if status == 404 {
            return Err(UpstreamError::NotFound(key.to_string()));
        }
        if status == 429 {
            return Err(UpstreamError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            UpstreamError::ParseError(format!("Failed to parse {} response: {}", key, e))
        })?;

        UpstreamRecord::from_value(body).ok_or_else(|| {
            UpstreamError::ParseError(format!("Response for {} is not an object", key))
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
