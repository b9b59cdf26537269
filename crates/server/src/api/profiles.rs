//! Per-user profile cache handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use marquee_core::{ProfileCacheError, ProfileCacheKey, ProfileDocument};

use super::catalog::PageParams;
use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::state::AppState;

/// Header naming the profile a blob belongs to.
pub const PROFILE_ID_HEADER: &str = "x-profile-id";

#[derive(Debug, Deserialize)]
pub struct ProfilePath {
    pub hashed_login: String,
    pub path: String,
    pub file_hash: String,
}

impl ProfilePath {
    fn key(&self) -> ProfileCacheKey<'_> {
        ProfileCacheKey {
            hashed_login: &self.hashed_login,
            path: &self.path,
            file_hash: &self.file_hash,
        }
    }
}

/// GET /api/v1/profiles/{hashed_login}/{path}/{file_hash}
pub async fn get_profile_cache(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ProfilePath>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProfileDocument>, ApiError> {
    state
        .profiles()
        .get(path.key(), params.page, params.per_page)
        .await
        .map(Json)
        .map_err(profile_error)
}

/// POST /api/v1/profiles/{hashed_login}/{path}/{file_hash}
pub async fn save_profile_cache(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ProfilePath>,
    headers: HeaderMap,
    Json(document): Json<Value>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let profile_id = headers
        .get(PROFILE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("default");

    state
        .profiles()
        .save(path.key(), profile_id, document)
        .await
        .map_err(profile_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: "Cache saved".to_string(),
        }),
    ))
}

/// DELETE /api/v1/profiles/{hashed_login}/{path}/{file_hash}
pub async fn delete_profile_cache(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ProfilePath>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .profiles()
        .delete(path.key())
        .await
        .map_err(profile_error)?;

    Ok(Json(SuccessResponse {
        message: "Cache deleted".to_string(),
    }))
}

fn profile_error(e: ProfileCacheError) -> ApiError {
    let status = match &e {
        ProfileCacheError::NotFound => StatusCode::NOT_FOUND,
        ProfileCacheError::InvalidSegment(_)
        | ProfileCacheError::InvalidDocument
        | ProfileCacheError::InvalidPage => StatusCode::BAD_REQUEST,
        ProfileCacheError::Corrupt(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileCacheError::Io { .. } => {
            error!(error = %e, "Profile cache I/O failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}
