//! Local catalog documents.
//!
//! A catalog is a JSON document per category, read from disk and paged by
//! the pipeline. The store itself is a thin reader; shape decisions live in
//! [`CatalogDocument`].

mod document;
mod fs;

pub use document::CatalogDocument;
pub use fs::FsCatalogStore;
pub(crate) use fs::decode_document_bytes;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog not found: {0}")]
    NotFound(String),

    #[error("Invalid catalog name: {0}")]
    InvalidName(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog JSON: {0}")]
    Json(String),

    #[error("Unsupported catalog format: {0}")]
    Format(String),
}

/// Read-only access to catalog documents by category.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load(&self, category: &str) -> Result<Arc<CatalogDocument>, CatalogError>;
}

/// Category names map onto file names, so only a safe charset is allowed.
pub fn validate_category(category: &str) -> Result<(), CatalogError> {
    let valid = !category.is_empty()
        && category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CatalogError::InvalidName(category.to_string()))
    }
}
