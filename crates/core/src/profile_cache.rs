//! Per-user compressed JSON blobs.
//!
//! Clients park their own list documents here under
//! `<dir>/<hashed_login>/<path>/<file_hash>` and read them back page by page.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{decode_document_bytes, CatalogDocument, CatalogError};
use crate::page::PageEnvelope;

#[derive(Debug, Error)]
pub enum ProfileCacheError {
    #[error("Cache not found")]
    NotFound,

    #[error("Invalid path segment: {0}")]
    InvalidSegment(String),

    #[error("Document must be a JSON object")]
    InvalidDocument,

    #[error("page and per_page must be at least 1")]
    InvalidPage,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unreadable cache: {0}")]
    Corrupt(String),
}

/// Address of one blob.
#[derive(Debug, Clone, Copy)]
pub struct ProfileCacheKey<'a> {
    pub hashed_login: &'a str,
    pub path: &'a str,
    pub file_hash: &'a str,
}

/// What a read returns: a page when the document is a list, the document
/// itself otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProfileDocument {
    Page(PageEnvelope),
    Whole(Value),
}

pub struct ProfileCacheStore {
    dir: PathBuf,
}

impl ProfileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn blob_path(&self, key: ProfileCacheKey<'_>) -> Result<PathBuf, ProfileCacheError> {
        for segment in [key.hashed_login, key.path, key.file_hash] {
            validate_segment(segment)?;
        }
        Ok(self
            .dir
            .join(key.hashed_login)
            .join(key.path)
            .join(key.file_hash))
    }

    /// Read a blob and page it.
    pub async fn get(
        &self,
        key: ProfileCacheKey<'_>,
        page: usize,
        per_page: usize,
    ) -> Result<ProfileDocument, ProfileCacheError> {
        if page == 0 || per_page == 0 {
            return Err(ProfileCacheError::InvalidPage);
        }

        let path = self.blob_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Profile cache not found");
                return Err(ProfileCacheError::NotFound);
            }
            Err(source) => return Err(io_error(&path, source)),
        };

        let value = decode_document_bytes(&bytes)
            .map_err(|e| ProfileCacheError::Corrupt(e.to_string()))?;

        match CatalogDocument::from_value(value.clone()) {
            // Only result lists are paged; an `items` blob is returned as stored.
            Ok(CatalogDocument::Items(_)) => {
                debug!(path = %path.display(), "Serving profile cache without paging");
                Ok(ProfileDocument::Whole(value))
            }
            Ok(document) => {
                let envelope = PageEnvelope::raw(document.entries(), page, per_page);
                debug!(
                    path = %path.display(),
                    returned = envelope.results.len(),
                    total = envelope.total_results,
                    "Serving paged profile cache"
                );
                Ok(ProfileDocument::Page(envelope))
            }
            Err(CatalogError::Format(_)) => {
                debug!(path = %path.display(), "Serving profile cache without paging");
                Ok(ProfileDocument::Whole(value))
            }
            Err(e) => Err(ProfileCacheError::Corrupt(e.to_string())),
        }
    }

    /// Stamp and store a document, replacing any previous blob.
    pub async fn save(
        &self,
        key: ProfileCacheKey<'_>,
        profile_id: &str,
        document: Value,
    ) -> Result<PathBuf, ProfileCacheError> {
        let path = self.blob_path(key)?;

        let Value::Object(mut map) = document else {
            return Err(ProfileCacheError::InvalidDocument);
        };
        map.insert("cached_at".to_string(), Value::from(Utc::now().to_rfc3339()));
        map.insert("profile_id".to_string(), Value::from(profile_id));
        map.insert("hashed_login".to_string(), Value::from(key.hashed_login));

        let json = serde_json::to_vec_pretty(&Value::Object(map))
            .map_err(|e| ProfileCacheError::Corrupt(e.to_string()))?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|source| io_error(&path, source))?;
        let compressed = encoder.finish().map_err(|source| io_error(&path, source))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }
        tokio::fs::write(&path, compressed)
            .await
            .map_err(|source| io_error(&path, source))?;

        info!(path = %path.display(), profile_id = %profile_id, "Profile cache saved");
        Ok(path)
    }

    pub async fn delete(&self, key: ProfileCacheKey<'_>) -> Result<(), ProfileCacheError> {
        let path = self.blob_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Profile cache deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Profile cache not found for deletion");
                Err(ProfileCacheError::NotFound)
            }
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

fn validate_segment(segment: &str) -> Result<(), ProfileCacheError> {
    let valid = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ProfileCacheError::InvalidSegment(segment.to_string()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ProfileCacheError {
    ProfileCacheError::Io {
        path: path.display().to_string(),
        source,
    }
}
