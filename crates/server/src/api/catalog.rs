//! Paged catalog handler.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::error;

use marquee_core::{CatalogError, PageEnvelope, PipelineError};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

/// GET /{category}
///
/// One page of a catalog, enriched when the catalog holds `items`.
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageEnvelope>, ApiError> {
    state
        .pipeline()
        .fetch_page(&category, params.page, params.per_page)
        .await
        .map(Json)
        .map_err(pipeline_error)
}

pub(crate) fn pipeline_error(e: PipelineError) -> ApiError {
    let status = match &e {
        PipelineError::InvalidPage | PipelineError::InvalidPerPage => StatusCode::BAD_REQUEST,
        PipelineError::Forbidden => StatusCode::FORBIDDEN,
        PipelineError::Catalog(CatalogError::NotFound(_) | CatalogError::InvalidName(_)) => {
            StatusCode::NOT_FOUND
        }
        PipelineError::Catalog(CatalogError::Format(_) | CatalogError::Json(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::Catalog(CatalogError::Io { .. }) => {
            error!(error = %e, "Catalog read failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}
