//! Enrichment cache administration.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};

use marquee_core::CacheInfo;

use super::catalog::pipeline_error;
use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::state::AppState;

/// Header carrying the clear secret.
pub const CACHE_SECRET_HEADER: &str = "x-cache-secret";

/// GET /api/v1/cache/info
pub async fn get_info(State(state): State<Arc<AppState>>) -> Json<CacheInfo> {
    Json(state.pipeline().cache_info().await)
}

/// POST /api/v1/cache/clear
///
/// Requires the configured secret in `X-Cache-Secret` or as a bearer token.
pub async fn clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(secret) = extract_secret(&headers) else {
        return Err(api_error(StatusCode::FORBIDDEN, "Missing cache secret"));
    };

    state
        .pipeline()
        .clear_cache(secret)
        .await
        .map_err(pipeline_error)?;

    Ok(Json(SuccessResponse {
        message: "Cache cleared".to_string(),
    }))
}

fn extract_secret(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(CACHE_SECRET_HEADER) {
        return value.to_str().ok();
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_secret_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert_eq!(extract_secret(&headers), Some("s3cret"));
    }

    #[test]
    fn test_extract_secret_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert_eq!(extract_secret(&headers), Some("s3cret"));
    }

    #[test]
    fn test_extract_secret_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_secret(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_secret(&headers), None);
    }
}
